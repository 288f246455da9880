//! Implements the `InventoryStore` trait using in-memory data.
//!
//! Note: this is compiled in the production build too. `pantry import --dry-run` copies the
//! database into a `MemoryStore` and imports into that instead.

use crate::model::{InventoryItem, ItemPatch, TransactionRecord};
use crate::store::InventoryStore;
use crate::Result;
use anyhow::{bail, Context};

/// An `InventoryStore` that holds everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: Vec<InventoryItem>,
    transactions: Vec<TransactionRecord>,
    #[cfg(test)]
    pub(crate) faults: Faults,
}

/// Failures that tests can inject into a `MemoryStore`.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct Faults {
    pub(crate) fetch: bool,
    pub(crate) append: bool,
    /// Fail `insert_item` for items with this name.
    pub(crate) insert_named: Option<String>,
    /// Fail the next `update_item` of the item with this name. Later updates succeed.
    pub(crate) update_named: Option<String>,
}

impl MemoryStore {
    /// Create a new `MemoryStore` seeded with `items`.
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }
}

#[async_trait::async_trait]
impl InventoryStore for MemoryStore {
    async fn fetch_items(&mut self) -> Result<Vec<InventoryItem>> {
        #[cfg(test)]
        if self.faults.fetch {
            bail!("injected fetch failure");
        }
        let mut items = self.items.clone();
        items.sort_by_key(|item| InventoryItem::match_key(&item.name));
        Ok(items)
    }

    async fn update_item(&mut self, id: &str, patch: &ItemPatch) -> Result<()> {
        #[cfg(test)]
        if let Some(name) = &self.faults.update_named {
            if self.items.iter().any(|item| item.id == id && &item.name == name) {
                self.faults.update_named = None;
                bail!("injected update failure");
            }
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .with_context(|| format!("Item '{id}' not found"))?;
        item.apply(patch);
        Ok(())
    }

    async fn insert_item(&mut self, item: &InventoryItem) -> Result<()> {
        #[cfg(test)]
        if self.faults.insert_named.as_deref() == Some(item.name.as_str()) {
            bail!("injected insert failure");
        }
        if self.items.iter().any(|existing| existing.id == item.id) {
            bail!("Item '{}' already exists", item.id);
        }
        self.items.push(item.clone());
        Ok(())
    }

    async fn append_transaction(&mut self, record: &TransactionRecord) -> Result<()> {
        #[cfg(test)]
        if self.faults.append {
            bail!("injected append failure");
        }
        if self.transactions.iter().any(|r| r.id == record.id) {
            return Ok(());
        }
        self.transactions.push(record.clone());
        Ok(())
    }
}
