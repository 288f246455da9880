use crate::model::{InventoryItem, StockUnit};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether stock came into the pantry or went out of it.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    In,
    Out,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

/// An entry in the append-only stock movement log.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub kind: TransactionKind,
    pub item_id: String,
    pub item_name: String,
    /// Stock moved, in `unit`.
    pub quantity: Decimal,
    pub unit: StockUnit,
    /// Price per purchase unit at the time of the movement.
    pub cost: Decimal,
    pub total_cost: Decimal,
    pub actor_id: String,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Builds a record for `item`, taking its id, name, unit and cost.
    pub fn for_item(
        id: impl Into<String>,
        kind: TransactionKind,
        item: &InventoryItem,
        quantity: Decimal,
        total_cost: Decimal,
        actor_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            quantity,
            unit: item.unit,
            cost: item.cost,
            total_cost,
            actor_id: actor_id.into(),
            created_at,
        }
    }
}
