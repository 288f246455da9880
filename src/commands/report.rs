use crate::commands::Out;
use crate::model::{InventoryItem, StockUnit, TransactionKind, TransactionRecord};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A summary of the shelves and of recent stock movement.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Length of the movement window, ending at `generated_at`.
    pub days: u32,
    pub item_count: usize,
    /// Sum of quantity times cost over all items.
    pub stock_value: Decimal,
    /// Items at or below the low stock threshold, lowest first.
    pub low_stock: Vec<LowStockItem>,
    pub received: Movement,
    pub distributed: Movement,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub id: String,
    pub name: String,
    pub quantity: Decimal,
    pub unit: StockUnit,
}

/// Totals for one direction of movement.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub count: usize,
    /// Summed across units, so only meaningful as a rough volume.
    pub quantity: Decimal,
    pub total_cost: Decimal,
}

impl Movement {
    fn add(&mut self, record: &TransactionRecord) -> Result<()> {
        self.count += 1;
        self.quantity = self
            .quantity
            .checked_add(record.quantity)
            .context("Moved quantity is too large")?;
        self.total_cost = self
            .total_cost
            .checked_add(record.total_cost)
            .context("Moved cost is too large")?;
        Ok(())
    }
}

/// Builds a report from the full item list and the transactions of the last `days` days.
pub fn build_report(
    items: &[InventoryItem],
    transactions: &[TransactionRecord],
    low_stock_threshold: Decimal,
    days: u32,
    now: DateTime<Utc>,
) -> Result<Report> {
    let mut stock_value = Decimal::ZERO;
    for item in items {
        stock_value = item
            .quantity
            .checked_mul(item.cost)
            .and_then(|value| stock_value.checked_add(value))
            .with_context(|| format!("Stock value overflowed at '{}'", item.name))?;
    }

    let mut low_stock: Vec<LowStockItem> = items
        .iter()
        .filter(|item| item.quantity <= low_stock_threshold)
        .map(|item| LowStockItem {
            id: item.id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit,
        })
        .collect();
    low_stock.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));

    let since = utils::days_before(now, days)?;
    let mut received = Movement::default();
    let mut distributed = Movement::default();
    for record in transactions.iter().filter(|r| r.created_at >= since) {
        match record.kind {
            TransactionKind::In => received.add(record)?,
            TransactionKind::Out => distributed.add(record)?,
        }
    }

    Ok(Report {
        generated_at: now,
        days,
        item_count: items.len(),
        stock_value,
        low_stock,
        received,
        distributed,
    })
}

/// Reports on the inventory and the last `days` days of transactions.
pub async fn report(config: Config, days: u32) -> Result<Out<Report>> {
    let now = Utc::now();
    let since = utils::days_before(now, days)?;
    let db = config.db();
    let items = db.items().await?;
    let transactions = db.transactions_since(since).await?;
    let report = build_report(
        &items,
        &transactions,
        config.low_stock_threshold(),
        days,
        now,
    )?;
    Ok(Out::new(render(&report), report))
}

fn render(report: &Report) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "{} items, stock value {}",
        report.item_count,
        report.stock_value.round_dp(2)
    );
    let _ = writeln!(
        s,
        "Last {} days: received {} times ({} total, cost {}), distributed {} times ({} total)",
        report.days,
        report.received.count,
        report.received.quantity.normalize(),
        report.received.total_cost.round_dp(2),
        report.distributed.count,
        report.distributed.quantity.normalize(),
    );
    if report.low_stock.is_empty() {
        s.push_str("Nothing is low on stock");
    } else {
        s.push_str("Low on stock:");
        for item in &report.low_stock {
            let _ = write!(
                s,
                "\n  {} ({} {})",
                item.name,
                item.quantity.normalize(),
                item.unit
            );
        }
    }
    s
}
