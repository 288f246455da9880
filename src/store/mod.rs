//! The `InventoryStore` trait is the seam between the import logic and wherever inventory lives.
//!
//! `Db` implements it against the SQLite file in the pantry home. `MemoryStore` implements it
//! with in-memory data so that an import can be previewed without writing anything.

mod memory;

use crate::model::{InventoryItem, ItemPatch, TransactionRecord};
use crate::Result;

pub use memory::MemoryStore;

/// Read and write access to inventory items and the transaction log.
#[async_trait::async_trait]
pub trait InventoryStore: Send {
    /// Returns every inventory item, ordered by name.
    async fn fetch_items(&mut self) -> Result<Vec<InventoryItem>>;

    /// Overwrites the patched fields of the item with `id`. Errors if no such item exists.
    async fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<()>;

    /// Adds a new item. Errors if an item with the same id exists.
    async fn insert_item(&mut self, item: &InventoryItem) -> Result<()>;

    /// Appends to the transaction log. Appending a record whose id is already in the log is a
    /// successful no-op, so a record can safely be written again after an uncertain failure.
    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<()>;
}
