//! Reconciles imported CSV rows against the existing inventory.
//!
//! Rows are processed strictly in order, one at a time. Each row either tops up an existing item
//! (matched by case-insensitive name) or creates a new one, and then appends an `in` record to the
//! transaction log. A bad row is counted and reported but never stops the rest of the batch.

use crate::model::{
    parse_price, parse_weight, CheckoutLimit, ImportRow, InventoryItem, ItemPatch,
    TransactionKind, TransactionRecord, DEFAULT_CATEGORY,
};
use crate::store::InventoryStore;
use crate::{utils, Result};
use anyhow::{ensure, Context};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Settings that apply to every row of an import.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImportOptions {
    /// Recorded as the actor on every transaction record.
    pub actor_id: String,
    /// Category given to newly created items.
    pub category: String,
    /// Checkout limit given to newly created items.
    pub limit: CheckoutLimit,
}

impl ImportOptions {
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            category: DEFAULT_CATEGORY.to_string(),
            limit: CheckoutLimit::default(),
        }
    }
}

/// The outcome of an import.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    /// True when no row failed.
    pub success: bool,
    pub updated: usize,
    pub added: usize,
    pub failed: usize,
    /// One message per failed row, in input order.
    pub errors: Vec<String>,
    /// Ids of transaction records that could not be appended. The stock change for these rows was
    /// saved; only the log entry is missing.
    pub unlogged: Vec<String>,
}

impl ImportResult {
    /// Total rows accounted for.
    pub fn processed(&self) -> usize {
        self.updated + self.added + self.failed
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum RowOutcome {
    Updated,
    Added,
}

/// The inventory as the import sees it, keyed by `InventoryItem::match_key`.
///
/// Seeded from a single fetch and kept current as rows are written, so that a product appearing
/// twice in one file is created once and then topped up.
struct SnapshotIndex {
    items: HashMap<String, InventoryItem>,
}

impl SnapshotIndex {
    fn new(items: Vec<InventoryItem>) -> Self {
        let mut map = HashMap::with_capacity(items.len());
        for item in items {
            // the first of any same-named items wins
            map.entry(InventoryItem::match_key(&item.name))
                .or_insert(item);
        }
        Self { items: map }
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut InventoryItem> {
        self.items.get_mut(&InventoryItem::match_key(name))
    }

    fn insert(&mut self, item: InventoryItem) {
        self.items.insert(InventoryItem::match_key(&item.name), item);
    }
}

/// Imports `rows` into `store`.
///
/// Never returns an error. If the existing inventory cannot be fetched, nothing is imported and
/// the result carries a single error. Otherwise every row is counted exactly once as updated,
/// added or failed.
///
/// Each row's transaction record gets the id `import-<batch>-<row>`, where the row number counts
/// data rows from 1. A record that fails to append is logged and listed in
/// `ImportResult::unlogged`; the row still counts as a success.
pub async fn process_csv_import<S>(
    rows: &[ImportRow],
    store: &mut S,
    options: &ImportOptions,
) -> ImportResult
where
    S: InventoryStore + ?Sized,
{
    let batch_id = utils::generate_batch_id(Utc::now());
    info!("Importing {} rows as batch {batch_id}", rows.len());

    let mut result = ImportResult::default();
    let mut index = match store.fetch_items().await {
        Ok(items) => {
            debug!("Fetched {} existing items", items.len());
            SnapshotIndex::new(items)
        }
        Err(e) => {
            error!("Unable to fetch existing inventory: {e:#}");
            result
                .errors
                .push(format!("Import failed, unable to fetch existing inventory: {e:#}"));
            return result;
        }
    };

    for (ix, row) in rows.iter().enumerate() {
        let row_number = ix + 1;
        let transaction_id = format!("import-{batch_id}-{row_number:05}");
        match reconcile_row(row, &mut index, store, options, &transaction_id).await {
            Ok((outcome, record)) => {
                match outcome {
                    RowOutcome::Updated => result.updated += 1,
                    RowOutcome::Added => result.added += 1,
                }
                if let Err(e) = store.append_transaction(&record).await {
                    warn!(
                        "Saved row {row_number} ('{}') but could not log transaction {}: {e:#}",
                        record.item_name, record.id
                    );
                    result.unlogged.push(record.id);
                }
            }
            Err(e) => {
                let product = row.product.trim();
                let message = if product.is_empty() {
                    format!("Row {row_number}: {e:#}")
                } else {
                    format!("Row {row_number} '{product}': {e:#}")
                };
                warn!("{message}");
                result.failed += 1;
                result.errors.push(message);
            }
        }
    }

    result.success = result.failed == 0;
    info!(
        "Import finished: {} updated, {} added, {} failed",
        result.updated, result.added, result.failed
    );
    result
}

/// Validates and normalizes one row, then writes it to the store and the index. Returns the
/// transaction record to append.
async fn reconcile_row<S>(
    row: &ImportRow,
    index: &mut SnapshotIndex,
    store: &mut S,
    options: &ImportOptions,
    transaction_id: &str,
) -> Result<(RowOutcome, TransactionRecord)>
where
    S: InventoryStore + ?Sized,
{
    let name = row.product.trim();
    ensure!(!name.is_empty(), "product name is missing");

    let order_quantity = row.order_quantities.value();
    ensure!(
        order_quantity > Decimal::ZERO,
        "order quantity must be greater than zero, got {order_quantity}"
    );

    let price = parse_price(&row.price_per_unit);
    let weight = parse_weight(&row.weight_amount);
    let quantity_to_add = if weight.is_weighed() {
        weight
            .value
            .checked_mul(order_quantity)
            .context("weight times order quantity is too large")?
    } else {
        order_quantity
    };
    // priced per purchase unit, so weight does not enter into it
    let total_cost = price
        .checked_mul(order_quantity)
        .context("price times order quantity is too large")?;
    let now = Utc::now();

    if let Some(item) = index.get_mut(name) {
        let patch = ItemPatch {
            quantity: item
                .quantity
                .checked_add(quantity_to_add)
                .context("resulting stock quantity is too large")?,
            cost: price,
            updated_at: now,
        };
        store
            .update_item(&item.id, &patch)
            .await
            .with_context(|| format!("unable to update item {}", item.id))?;
        item.apply(&patch);
        debug!(
            "Added {quantity_to_add} {} to '{}', now {}",
            item.unit, item.name, item.quantity
        );
        let record = TransactionRecord::for_item(
            transaction_id,
            TransactionKind::In,
            item,
            quantity_to_add,
            total_cost,
            &options.actor_id,
            now,
        );
        return Ok((RowOutcome::Updated, record));
    }

    let item = InventoryItem {
        id: utils::generate_item_id(now),
        name: name.to_string(),
        category: options.category.clone(),
        quantity: quantity_to_add,
        unit: weight.unit,
        is_weighed: weight.is_weighed(),
        cost: price,
        limit: options.limit,
        created_at: now,
        updated_at: now,
    };
    store
        .insert_item(&item)
        .await
        .with_context(|| format!("unable to add new item '{name}'"))?;
    debug!(
        "Created '{}' ({}) with {quantity_to_add} {}",
        item.name, item.id, item.unit
    );
    let record = TransactionRecord::for_item(
        transaction_id,
        TransactionKind::In,
        &item,
        quantity_to_add,
        total_cost,
        &options.actor_id,
        now,
    );
    index.insert(item);
    Ok((RowOutcome::Added, record))
}
