use crate::model::StockUnit;
use crate::Result;
use anyhow::{bail, ensure};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The category given to items that are created by a CSV import.
pub const DEFAULT_CATEGORY: &str = "other";

/// How much of an item a single student may check out within a rolling window of days.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLimit {
    pub quantity: Decimal,
    pub days: u32,
}

impl Default for CheckoutLimit {
    /// One unit per seven days.
    fn default() -> Self {
        Self {
            quantity: Decimal::ONE,
            days: 7,
        }
    }
}

/// A row of the inventory.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Stock on hand, in `unit`.
    pub quantity: Decimal,
    pub unit: StockUnit,
    pub is_weighed: bool,
    /// The most recent price paid per purchase unit.
    pub cost: Decimal,
    pub limit: CheckoutLimit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// The key used to match imported product names against existing items.
    pub fn match_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Applies a patch to this item in place.
    pub fn apply(&mut self, patch: &ItemPatch) {
        self.quantity = patch.quantity;
        self.cost = patch.cost;
        self.updated_at = patch.updated_at;
    }

    /// Validates that a student may take `quantity` of this item, given the amount they have
    /// already taken inside the limit window. Returns the stock that will remain.
    pub fn check_out(&self, quantity: Decimal, already_taken: Decimal) -> Result<Decimal> {
        ensure!(
            quantity > Decimal::ZERO,
            "Checkout quantity must be greater than zero, got {quantity}"
        );
        if quantity > self.quantity {
            bail!(
                "Only {} {} of '{}' in stock, cannot check out {quantity}",
                self.quantity,
                self.unit,
                self.name
            );
        }
        let allowed = self.limit.quantity - already_taken;
        if quantity > allowed {
            bail!(
                "Checkout limit for '{}' is {} {} per {} days; {} already taken in that window",
                self.name,
                self.limit.quantity,
                self.unit,
                self.limit.days,
                already_taken
            );
        }
        Ok(self.quantity - quantity)
    }
}

/// The fields of an existing item that an import is allowed to change.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub quantity: Decimal,
    pub cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rice(quantity: i64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: "item-1".to_string(),
            name: "Rice".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            quantity: Decimal::from(quantity),
            unit: StockUnit::Kg,
            is_weighed: true,
            cost: Decimal::new(199, 2),
            limit: CheckoutLimit {
                quantity: Decimal::from(2),
                days: 7,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_match_key() {
        assert_eq!(InventoryItem::match_key("  Brown RICE "), "brown rice");
    }

    #[test]
    fn test_apply_patch() {
        let mut item = rice(1);
        let later = item.updated_at + chrono::Duration::seconds(5);
        item.apply(&ItemPatch {
            quantity: Decimal::from(21),
            cost: Decimal::new(250, 2),
            updated_at: later,
        });
        assert_eq!(item.quantity, Decimal::from(21));
        assert_eq!(item.cost, Decimal::new(250, 2));
        assert_eq!(item.updated_at, later);
    }

    #[test]
    fn test_check_out_within_limit() {
        let item = rice(10);
        let remaining = item.check_out(Decimal::ONE, Decimal::ONE).unwrap();
        assert_eq!(remaining, Decimal::from(9));
    }

    #[test]
    fn test_check_out_over_limit() {
        let item = rice(10);
        let err = item.check_out(Decimal::from(2), Decimal::ONE).unwrap_err();
        assert!(err.to_string().contains("Checkout limit"));
    }

    #[test]
    fn test_check_out_over_stock() {
        let item = rice(1);
        let err = item.check_out(Decimal::from(2), Decimal::ZERO).unwrap_err();
        assert!(err.to_string().contains("in stock"));
    }

    #[test]
    fn test_check_out_non_positive() {
        let item = rice(1);
        assert!(item.check_out(Decimal::ZERO, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_default_limit() {
        let limit = CheckoutLimit::default();
        assert_eq!(limit.quantity, Decimal::ONE);
        assert_eq!(limit.days, 7);
    }
}
