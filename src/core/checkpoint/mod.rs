//! Checkpoint store adapter
//!
//! The checkpoint table records every row ever sampled. The sampler reads it
//! whole before each run and appends the rows it selected.

use crate::adapters::store::KeyValueStore;
use crate::core::ingest::writer::{BatchWriter, WriteResult};
use crate::domain::{CheckpointRecord, Item, Result, TripstreamError};
use std::sync::Arc;

/// Read every item of a table, following continuation keys until exhausted
///
/// Callers never see a partial table: any page failure fails the whole read
/// with `UpstreamRead`.
pub async fn scan_all(
    store: &(dyn KeyValueStore + Send + Sync),
    table: &str,
    projection: Option<&[&str]>,
    page_size: usize,
) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;
    let mut pages = 0usize;

    loop {
        let page = store
            .scan_page(table, projection, start_key.as_ref(), page_size)
            .await
            .map_err(|e| {
                TripstreamError::UpstreamRead(format!("Failed to read data from table {table}: {e}"))
            })?;
        pages += 1;
        items.extend(page.items);

        match page.last_evaluated_key {
            Some(key) => start_key = Some(key),
            None => break,
        }
    }

    tracing::debug!(table = table, pages = pages, items = items.len(), "Scanned table");
    Ok(items)
}

/// Read/append view over the checkpoint table
pub struct CheckpointStore {
    store: Arc<dyn KeyValueStore + Send + Sync>,
    table: String,
    page_size: usize,
    writer: BatchWriter,
}

impl CheckpointStore {
    /// Create a checkpoint view
    ///
    /// # Arguments
    ///
    /// * `store` - Store holding the checkpoint table
    /// * `table` - Checkpoint table name
    /// * `page_size` - Items requested per scan page
    /// * `writer` - Writer used for appends, normally over the same store
    pub fn new(
        store: Arc<dyn KeyValueStore + Send + Sync>,
        table: impl Into<String>,
        page_size: usize,
        writer: BatchWriter,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            page_size,
            writer,
        }
    }

    /// Checkpoint table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Read every checkpoint record in scan order
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if any page fails or an item has no key.
    pub async fn read_all(&self) -> Result<Vec<CheckpointRecord>> {
        let items = scan_all(self.store.as_ref(), &self.table, None, self.page_size).await?;
        items.iter().map(CheckpointRecord::from_item).collect()
    }

    /// Number of checkpoint records
    pub async fn count(&self) -> Result<usize> {
        let keys = scan_all(
            self.store.as_ref(),
            &self.table,
            Some(&[crate::domain::ID_ATTRIBUTE][..]),
            self.page_size,
        )
        .await?;
        Ok(keys.len())
    }

    /// Durably append records with retry
    ///
    /// # Errors
    ///
    /// Returns `WriteRetryExhaustion` if some records could not be written.
    pub async fn append(&self, records: &[CheckpointRecord]) -> Result<WriteResult> {
        let items = records.iter().map(CheckpointRecord::to_item).collect();
        let result = self.writer.write_all(&self.table, items).await?;

        tracing::info!(
            table = %self.table,
            appended = result.items_written,
            "Checkpoint updated"
        );
        Ok(result)
    }
}
