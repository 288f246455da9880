//! This module is responsible for reading, writing and managing the SQLite database.
//!
//! Decimal values are stored as text so that quantities and prices keep their exact value, and
//! timestamps are stored as fixed-precision RFC 3339 text so that they sort correctly.

mod migrations;

use crate::model::{
    CheckoutLimit, InventoryItem, ItemPatch, StockUnit, TransactionKind, TransactionRecord,
};
use crate::store::InventoryStore;
use crate::utils::{parse_timestamp, timestamp};
use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const SELECT_ITEMS: &str = "SELECT id, name, category, quantity, unit, is_weighed, cost, \
    limit_quantity, limit_days, created_at, updated_at FROM items";

const SELECT_TRANSACTIONS: &str = "SELECT id, kind, item_id, item_name, quantity, unit, cost, \
    total_cost, actor_id, created_at FROM transactions";

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at '{}'", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Created database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Creates a SQLite client
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let version = migrations::current_version(&pool).await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema is at version {version}, which is newer than this program \
                supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, version, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    /// Returns every item, ordered by name.
    pub(crate) async fn items(&self) -> Result<Vec<InventoryItem>> {
        let rows: Vec<ItemRow> =
            sqlx::query_as(&format!("{SELECT_ITEMS} ORDER BY name COLLATE NOCASE, id"))
                .fetch_all(&self.pool)
                .await
                .context("Failed to query items")?;
        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    /// Returns the `limit` most recent transaction records, newest first.
    pub(crate) async fn recent_transactions(&self, limit: u32) -> Result<Vec<TransactionRecord>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TRANSACTIONS} ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("Failed to query transactions")?;
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    /// Returns every transaction record created at or after `since`, oldest first.
    pub(crate) async fn transactions_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{SELECT_TRANSACTIONS} WHERE created_at >= ? ORDER BY created_at, id"
        ))
        .bind(timestamp(since))
        .fetch_all(&self.pool)
        .await
        .context("Failed to query transactions")?;
        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    /// Takes `quantity` of an item out of stock on behalf of `student_id`.
    ///
    /// `item` is matched against item ids first and then against names, using the same
    /// case-insensitive key as the importer. The stock check, the limit check, the stock update
    /// and the `out` record all happen in one SQLite transaction, so a rejected checkout changes
    /// nothing.
    pub(crate) async fn checkout(
        &self,
        item: &str,
        quantity: Decimal,
        student_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(InventoryItem, TransactionRecord)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin checkout transaction")?;

        let mut found = match find_item(&mut *tx, item).await? {
            Some(found) => found,
            None => bail!("No item with id or name '{item}'"),
        };

        let window_start = utils::days_before(now, found.limit.days)
            .with_context(|| format!("Invalid checkout limit for '{}'", found.name))?;
        let taken: Vec<(String,)> = sqlx::query_as(
            "SELECT quantity FROM transactions \
            WHERE kind = 'out' AND actor_id = ? AND item_id = ? AND created_at >= ?",
        )
        .bind(student_id)
        .bind(&found.id)
        .bind(timestamp(window_start))
        .fetch_all(&mut *tx)
        .await
        .context("Failed to query previous checkouts")?;
        let already_taken = taken
            .iter()
            .map(|(q,)| decimal("quantity", q))
            .sum::<Result<Decimal>>()?;

        let remaining = found.check_out(quantity, already_taken)?;

        sqlx::query("UPDATE items SET quantity = ?, updated_at = ? WHERE id = ?")
            .bind(remaining.to_string())
            .bind(timestamp(now))
            .bind(&found.id)
            .execute(&mut *tx)
            .await
            .context("Failed to update item stock")?;
        found.quantity = remaining;
        found.updated_at = now;

        let total_cost = found
            .cost
            .checked_mul(quantity)
            .context("Total cost is too large")?;
        let record = TransactionRecord::for_item(
            utils::generate_checkout_id(now),
            TransactionKind::Out,
            &found,
            quantity,
            total_cost,
            student_id,
            now,
        );
        insert_transaction(&mut *tx, &record, false).await?;

        tx.commit()
            .await
            .context("Failed to commit checkout transaction")?;
        Ok((found, record))
    }
}

#[async_trait::async_trait]
impl InventoryStore for Db {
    async fn fetch_items(&mut self) -> Result<Vec<InventoryItem>> {
        self.items().await
    }

    async fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<()> {
        let result =
            sqlx::query("UPDATE items SET quantity = ?, cost = ?, updated_at = ? WHERE id = ?")
                .bind(patch.quantity.to_string())
                .bind(patch.cost.to_string())
                .bind(timestamp(patch.updated_at))
                .bind(id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to update item '{id}'"))?;
        if result.rows_affected() == 0 {
            bail!("Item '{id}' not found");
        }
        Ok(())
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO items (id, name, category, quantity, unit, is_weighed, cost, \
            limit_quantity, limit_days, created_at, updated_at) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.quantity.to_string())
        .bind(item.unit.to_string())
        .bind(item.is_weighed)
        .bind(item.cost.to_string())
        .bind(item.limit.quantity.to_string())
        .bind(i64::from(item.limit.days))
        .bind(timestamp(item.created_at))
        .bind(timestamp(item.updated_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert item '{}'", item.name))?;
        Ok(())
    }

    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire a database connection")?;
        insert_transaction(&mut *conn, record, true).await
    }
}

/// Looks up an item by exact id, falling back to `InventoryItem::match_key` on the name. Names
/// are compared in Rust because SQLite's `NOCASE` only folds ASCII letters. When several items
/// share a key the one with the lowest id wins.
async fn find_item(
    conn: &mut sqlx::SqliteConnection,
    item: &str,
) -> Result<Option<InventoryItem>> {
    let by_id: Option<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} WHERE id = ?"))
        .bind(item)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up item by id")?;
    if let Some(row) = by_id {
        return InventoryItem::try_from(row).map(Some);
    }

    let key = InventoryItem::match_key(item);
    let rows: Vec<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} ORDER BY id"))
        .fetch_all(&mut *conn)
        .await
        .context("Failed to look up item by name")?;
    for row in rows {
        if InventoryItem::match_key(&row.name) == key {
            return InventoryItem::try_from(row).map(Some);
        }
    }
    Ok(None)
}

/// Inserts a transaction record. With `idempotent`, a record whose id already exists is left as
/// it is and the call succeeds.
async fn insert_transaction(
    conn: &mut sqlx::SqliteConnection,
    record: &TransactionRecord,
    idempotent: bool,
) -> Result<()> {
    let verb = if idempotent {
        "INSERT OR IGNORE"
    } else {
        "INSERT"
    };
    sqlx::query(&format!(
        "{verb} INTO transactions (id, kind, item_id, item_name, quantity, unit, cost, \
        total_cost, actor_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&record.id)
    .bind(record.kind.to_string())
    .bind(&record.item_id)
    .bind(&record.item_name)
    .bind(record.quantity.to_string())
    .bind(record.unit.to_string())
    .bind(record.cost.to_string())
    .bind(record.total_cost.to_string())
    .bind(&record.actor_id)
    .bind(timestamp(record.created_at))
    .execute(conn)
    .await
    .with_context(|| format!("Failed to append transaction '{}'", record.id))?;
    Ok(())
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

fn decimal(column: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid decimal in {column}: '{value}'"))
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    name: String,
    category: String,
    quantity: String,
    unit: String,
    is_weighed: bool,
    cost: String,
    limit_quantity: String,
    limit_days: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = anyhow::Error;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(Self {
            quantity: decimal("quantity", &row.quantity)?,
            unit: StockUnit::from_str(&row.unit)
                .with_context(|| format!("Invalid unit '{}' for item {}", row.unit, row.id))?,
            is_weighed: row.is_weighed,
            cost: decimal("cost", &row.cost)?,
            limit: CheckoutLimit {
                quantity: decimal("limit_quantity", &row.limit_quantity)?,
                days: u32::try_from(row.limit_days)
                    .with_context(|| format!("Invalid limit_days {}", row.limit_days))?,
            },
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            name: row.name,
            category: row.category,
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    kind: String,
    item_id: String,
    item_name: String,
    quantity: String,
    unit: String,
    cost: String,
    total_cost: String,
    actor_id: String,
    created_at: String,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(Self {
            kind: TransactionKind::from_str(&row.kind).with_context(|| {
                format!("Invalid kind '{}' for transaction {}", row.kind, row.id)
            })?,
            quantity: decimal("quantity", &row.quantity)?,
            unit: StockUnit::from_str(&row.unit).with_context(|| {
                format!("Invalid unit '{}' for transaction {}", row.unit, row.id)
            })?,
            cost: decimal("cost", &row.cost)?,
            total_cost: decimal("total_cost", &row.total_cost)?,
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            actor_id: row.actor_id,
        })
    }
}
