use serde::{Deserialize, Serialize};

/// The unit an inventory quantity is measured in.
///
/// `Item` is a discrete count. Every other unit is a mass, and an item stocked in one of them is a
/// weighed item.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StockUnit {
    #[default]
    Item,
    Kg,
    Lb,
    G,
    Oz,
}

serde_plain::derive_display_from_serialize!(StockUnit);
serde_plain::derive_fromstr_from_deserialize!(StockUnit);

impl StockUnit {
    /// Returns true for any unit of mass.
    pub fn is_weighed(&self) -> bool {
        !matches!(self, StockUnit::Item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unit_display_and_parse() {
        assert_eq!(StockUnit::Kg.to_string(), "kg");
        assert_eq!(StockUnit::Item.to_string(), "item");
        assert_eq!(StockUnit::from_str("oz").unwrap(), StockUnit::Oz);
        assert!(StockUnit::from_str("stone").is_err());
    }

    #[test]
    fn test_unit_is_weighed() {
        assert!(!StockUnit::Item.is_weighed());
        assert!(StockUnit::G.is_weighed());
        assert!(StockUnit::Lb.is_weighed());
    }
}
