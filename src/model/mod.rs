//! Types that represent the core data model, such as `InventoryItem` and `TransactionRecord`,
//! along with the parsers that turn supplier CSV cells into them.
mod import_row;
mod item;
mod normalize;
mod transaction;
mod unit;

pub use import_row::{read_import_rows, ImportColumn, ImportRow};
pub use item::{CheckoutLimit, InventoryItem, ItemPatch, DEFAULT_CATEGORY};
pub use normalize::{parse_price, parse_quantity, parse_weight, OrderQuantity, Weight};
pub use transaction::{TransactionKind, TransactionRecord};
pub use unit::StockUnit;
