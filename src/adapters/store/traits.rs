//! Key-value store abstraction traits
//!
//! This module defines the traits that store adapters must implement
//! to back checkpoint tables, target tables and ID counters.

use crate::domain::{Item, Result};
use async_trait::async_trait;

/// Largest number of items a single `batch_write` call accepts
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// One page of a table scan
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Items on this page, projected if a projection was requested
    pub items: Vec<Item>,

    /// Key to resume from, `None` once the table is exhausted
    pub last_evaluated_key: Option<Item>,
}

/// Paged scan and batched write over named tables
///
/// Every item is keyed by its `ID` attribute. Writes with an existing key
/// replace the stored item.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Ensure a table exists, creating it if necessary
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    async fn ensure_table(&self, table: &str) -> Result<()>;

    /// Read one page of a table
    ///
    /// # Arguments
    ///
    /// * `table` - Table to scan
    /// * `projection` - Attributes to return, or `None` for whole items
    /// * `start_key` - Continuation key from the previous page
    /// * `limit` - Maximum number of items on the page
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TableNotFound` for an unknown table and
    /// `StoreError::InvalidContinuation` for a key this table never issued.
    async fn scan_page(
        &self,
        table: &str,
        projection: Option<&[&str]>,
        start_key: Option<&Item>,
        limit: usize,
    ) -> Result<ScanPage>;

    /// Write up to [`MAX_BATCH_WRITE_ITEMS`] items
    ///
    /// Returns the items the store did not process. Callers resubmit them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BatchTooLarge` if more items are passed than one
    /// call accepts, or a store error if the whole call failed.
    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>>;
}

/// Named monotonic counters updated by compare-and-swap
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of a counter, `None` if it was never set
    async fn read_counter(&self, name: &str) -> Result<Option<u64>>;

    /// Set a counter to `new` only if it currently equals `expected`
    ///
    /// `expected = None` means the counter must not exist yet. Returns
    /// `false` when the current value differs, leaving it unchanged.
    async fn compare_and_swap(&self, name: &str, expected: Option<u64>, new: u64) -> Result<bool>;
}

/// Key of an item as a string
pub(crate) fn item_key(item: &Item) -> Option<&str> {
    item.get(crate::domain::ID_ATTRIBUTE).map(|value| value.as_str())
}

/// Copy of an item restricted to the projected attributes
pub(crate) fn project(item: &Item, projection: Option<&[&str]>) -> Item {
    match projection {
        None => item.clone(),
        Some(attributes) => item
            .iter()
            .filter(|(name, _)| attributes.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    }
}
