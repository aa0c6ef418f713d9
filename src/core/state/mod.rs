//! Sequential ID allocation
//!
//! - [`ScanAllocator`] derives the watermark from a full scan of the target table
//! - [`CounterAllocator`] advances an explicit counter by compare-and-swap
//!
//! The scan allocator assumes a single writer per target table. Concurrent
//! consumers should use `consumer.allocation = "counter"`.

pub mod allocator;
pub mod counter;
pub mod watermark;

pub use allocator::{IdAllocator, ScanAllocator};
pub use counter::CounterAllocator;
pub use watermark::{IdRun, IdWatermark};

use crate::adapters::store::StoreHandles;
use crate::config::{AllocationStrategy, TripstreamConfig};
use std::sync::Arc;

/// Create the allocator selected by `consumer.allocation` for the target table
pub fn create_allocator(
    config: &TripstreamConfig,
    handles: &StoreHandles,
) -> Arc<dyn IdAllocator + Send + Sync> {
    let target = config.pipeline.target_table();
    let scan = ScanAllocator::new(handles.tables.clone(), target.clone(), config.store.page_size);

    match config.consumer.allocation {
        AllocationStrategy::Scan => {
            tracing::debug!(table = %target, "Using scan allocator");
            Arc::new(scan)
        }
        AllocationStrategy::Counter => {
            let name = config.consumer.counter_name.clone().unwrap_or(target);
            tracing::debug!(counter = %name, "Using counter allocator");
            Arc::new(CounterAllocator::new(
                handles.counters.clone(),
                name,
                scan,
                config.consumer.cas_max_attempts,
            ))
        }
    }
}
