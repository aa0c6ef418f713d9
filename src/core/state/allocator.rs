//! Scan-based sequential ID allocation
//!
//! Every invocation recomputes the watermark with a full `ID` projection
//! scan of the target table. Two invocations running at once against the
//! same table can be handed overlapping runs; use
//! [`CounterAllocator`](super::counter::CounterAllocator) when that matters.

use super::watermark::{IdRun, IdWatermark};
use crate::adapters::store::KeyValueStore;
use crate::core::checkpoint::scan_all;
use crate::domain::{Result, TripstreamError, ID_ATTRIBUTE};
use async_trait::async_trait;
use std::sync::Arc;

/// Hands out increasing identifiers for a target table
#[async_trait]
pub trait IdAllocator: Send + Sync {
    /// Largest identifier already used, 0 if none
    async fn next_id(&self) -> Result<u64>;

    /// Reserve `count` consecutive identifiers above every used one
    async fn allocate_run(&self, count: usize) -> Result<IdRun>;
}

/// Allocator deriving the watermark from a full table scan
pub struct ScanAllocator {
    store: Arc<dyn KeyValueStore + Send + Sync>,
    table: String,
    page_size: usize,
}

impl ScanAllocator {
    /// Create an allocator for a target table
    pub fn new(
        store: Arc<dyn KeyValueStore + Send + Sync>,
        table: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            page_size,
        }
    }

    /// Scan the target table for its current watermark
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if the scan fails or any item has a missing or
    /// non-numeric `ID`.
    pub async fn watermark(&self) -> Result<IdWatermark> {
        let items = scan_all(
            self.store.as_ref(),
            &self.table,
            Some(&[ID_ATTRIBUTE][..]),
            self.page_size,
        )
        .await?;

        let mut max_id = 0u64;
        for item in &items {
            let value = item.get(ID_ATTRIBUTE).ok_or_else(|| {
                TripstreamError::UpstreamRead(format!("item in {} has no {ID_ATTRIBUTE}", self.table))
            })?;
            let id = value.as_u64().ok_or_else(|| {
                TripstreamError::UpstreamRead(format!(
                    "item in {} has non-numeric {ID_ATTRIBUTE} '{}'",
                    self.table,
                    value.as_str()
                ))
            })?;
            max_id = max_id.max(id);
        }

        tracing::debug!(
            table = %self.table,
            scanned = items.len(),
            max_id = max_id,
            "Computed ID watermark"
        );

        Ok(IdWatermark::new(self.table.clone(), max_id))
    }
}

#[async_trait]
impl IdAllocator for ScanAllocator {
    async fn next_id(&self) -> Result<u64> {
        Ok(self.watermark().await?.max_id)
    }

    async fn allocate_run(&self, count: usize) -> Result<IdRun> {
        let run = self.watermark().await?.next_run(count)?;
        tracing::info!(
            table = %self.table,
            start = run.start(),
            count = run.len(),
            "Allocated ID run"
        );
        Ok(run)
    }
}
