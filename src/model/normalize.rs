//! Lenient parsers for the free-text fields of an imported CSV row.
//!
//! None of these functions fail. Text that cannot be understood degrades to a default value so
//! that a sloppy cell never aborts an import on its own.

use crate::model::StockUnit;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// Tokens that mark a weight descriptor as a mass rather than a count.
const WEIGHT_TOKENS: &[&str] = &["kg", "kilo", "lb", "pound", "g", "oz"];

/// The first number in a weight descriptor, e.g. `1.5` in `"approx 1.5 kg bag"`.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").expect("the number pattern is a valid regex"));

/// Parses a price such as `"$1.29"` or `"1.29 USD"`. Returns zero if no number can be found.
pub fn parse_price(text: &str) -> Decimal {
    parse_stripped(text)
}

/// Parses a quantity such as `"20"` or `"20 cases"`. Returns zero if no number can be found.
pub fn parse_quantity(text: &str) -> Decimal {
    parse_stripped(text)
}

/// Removes every character other than ASCII digits and `.`, then parses the longest leading
/// decimal from what is left. `"1.2.3"` is `1.2`, `"abc"` is `0`.
fn parse_stripped(text: &str) -> Decimal {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    for (ix, c) in kept.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = ix + 1;
    }

    let number = kept[..end].trim_end_matches('.');
    if number.is_empty() {
        return Decimal::ZERO;
    }
    let number = if number.starts_with('.') {
        format!("0{number}")
    } else {
        number.to_string()
    };
    match Decimal::from_str(&number) {
        Ok(value) => value,
        Err(e) => {
            debug!("Treating '{text}' as 0, '{number}' does not fit in a decimal: {e}");
            Decimal::ZERO
        }
    }
}

/// The amount and unit described by a weight/amount cell, e.g. `"500g"` or `"1 item"`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: Decimal,
    pub unit: StockUnit,
}

impl Weight {
    /// A single discrete item.
    pub const ITEM: Weight = Weight {
        value: Decimal::ONE,
        unit: StockUnit::Item,
    };

    /// True when the descriptor named a mass. Derived from the unit so the two always agree.
    pub fn is_weighed(&self) -> bool {
        self.unit.is_weighed()
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::ITEM
    }
}

/// Parses a weight/amount descriptor.
///
/// If the text contains none of `kg`, `kilo`, `lb`, `pound`, `g` or `oz` the result is one item.
/// Otherwise the value is the first number in the text (one if there is none) and the unit is
/// chosen in the order `kg/kilo`, `lb/pound`, `g`, `oz`, so that `"1kg"` is never read as grams.
pub fn parse_weight(text: &str) -> Weight {
    let text = text.trim().to_lowercase();
    if !WEIGHT_TOKENS.iter().any(|token| text.contains(token)) {
        return Weight::ITEM;
    }

    let value = NUMBER
        .find(&text)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
        .unwrap_or(Decimal::ONE);

    let unit = if text.contains("kg") || text.contains("kilo") {
        StockUnit::Kg
    } else if text.contains("lb") || text.contains("pound") {
        StockUnit::Lb
    } else if text.contains('g') {
        StockUnit::G
    } else if text.contains("oz") {
        StockUnit::Oz
    } else {
        StockUnit::Item
    };

    Weight { value, unit }
}

/// The number of purchase units on an imported row.
///
/// Text that is already a plain number, sign included, is used as-is. Anything else goes through
/// [`parse_quantity`], so `"20 cases"` is `20` while `"-3"` stays `-3` and is later rejected.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderQuantity(Decimal);

impl OrderQuantity {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn parse(text: &str) -> Self {
        match Decimal::from_str(text.trim()) {
            Ok(value) => Self(value),
            Err(_) => Self(parse_quantity(text)),
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for OrderQuantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i32> for OrderQuantity {
    fn from(value: i32) -> Self {
        Self(Decimal::from(value))
    }
}

impl Display for OrderQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1.29"), Decimal::new(129, 2));
        assert_eq!(parse_price("abc"), Decimal::ZERO);
        assert_eq!(parse_price(""), Decimal::ZERO);
        assert_eq!(parse_price("  3 USD "), Decimal::from(3));
        assert_eq!(parse_price("$1,299.50"), Decimal::new(129950, 2));
    }

    #[test]
    fn test_parse_price_takes_leading_decimal() {
        assert_eq!(parse_price("1.2.3"), Decimal::new(12, 1));
        assert_eq!(parse_price(".5"), Decimal::new(5, 1));
        assert_eq!(parse_price("4."), Decimal::from(4));
        assert_eq!(parse_price("."), Decimal::ZERO);
    }

    #[test]
    fn test_parse_price_drops_sign() {
        assert_eq!(parse_price("-$2.00"), Decimal::from(2));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("20"), Decimal::from(20));
        assert_eq!(parse_quantity("12 cases"), Decimal::from(12));
        assert_eq!(parse_quantity("none"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_weight_kg() {
        let w = parse_weight("1 kg");
        assert_eq!(w.value, Decimal::ONE);
        assert_eq!(w.unit, StockUnit::Kg);
        assert!(w.is_weighed());
    }

    #[test]
    fn test_parse_weight_grams() {
        let w = parse_weight("500g");
        assert_eq!(w.value, Decimal::from(500));
        assert_eq!(w.unit, StockUnit::G);
    }

    #[test]
    fn test_parse_weight_item() {
        let w = parse_weight("1 item");
        assert_eq!(w, Weight::ITEM);
        assert!(!w.is_weighed());
        assert_eq!(parse_weight(""), Weight::ITEM);
        assert_eq!(parse_weight("6 cans"), Weight::ITEM);
    }

    #[test]
    fn test_parse_weight_priority() {
        assert_eq!(parse_weight("2 Kilos").unit, StockUnit::Kg);
        assert_eq!(parse_weight("5 lb bag").unit, StockUnit::Lb);
        assert_eq!(parse_weight("3 Pounds").unit, StockUnit::Lb);
        assert_eq!(parse_weight("16 oz").unit, StockUnit::Oz);
        assert_eq!(parse_weight("1.5KG").value, Decimal::new(15, 1));
    }

    #[test]
    fn test_parse_weight_without_number() {
        let w = parse_weight("kg");
        assert_eq!(w.value, Decimal::ONE);
        assert_eq!(w.unit, StockUnit::Kg);
    }

    #[test]
    fn test_order_quantity() {
        assert_eq!(OrderQuantity::parse("20").value(), Decimal::from(20));
        assert_eq!(OrderQuantity::parse(" 2.5 ").value(), Decimal::new(25, 1));
        assert_eq!(OrderQuantity::parse("-3").value(), Decimal::from(-3));
        assert_eq!(OrderQuantity::parse("20 cases").value(), Decimal::from(20));
        assert_eq!(OrderQuantity::parse("").value(), Decimal::ZERO);
    }

    #[test]
    fn test_too_many_digits_is_zero() {
        let huge = "100000000000000000000000000000";
        assert_eq!(parse_price(&format!("${huge}")), Decimal::ZERO);
        assert_eq!(parse_quantity(huge), Decimal::ZERO);
        assert_eq!(OrderQuantity::parse(huge).value(), Decimal::ZERO);
        // the largest value a decimal holds still parses
        assert_eq!(parse_quantity("79228162514264337593543950335"), Decimal::MAX);
    }
}
