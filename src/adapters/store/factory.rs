//! Store factory
//!
//! This module creates the key-value store selected by configuration.

use super::file::FileTableStore;
use super::memory::MemoryTableStore;
use super::traits::{CounterStore, KeyValueStore};
use crate::config::{StoreBackend, TripstreamConfig};
use crate::domain::Result;
use std::sync::Arc;

/// A table store together with the counter store backed by the same data
#[derive(Clone)]
pub struct StoreHandles {
    /// Checkpoint and target tables
    pub tables: Arc<dyn KeyValueStore + Send + Sync>,

    /// ID counters
    pub counters: Arc<dyn CounterStore + Send + Sync>,
}

/// Create the configured store and make sure the pipeline's tables exist
///
/// # Errors
///
/// Returns an error if the backend cannot be opened or a table cannot be
/// created.
pub async fn create_store(config: &TripstreamConfig) -> Result<StoreHandles> {
    let handles = match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Creating in-memory table store");
            let store = Arc::new(MemoryTableStore::new());
            StoreHandles {
                tables: store.clone() as Arc<dyn KeyValueStore + Send + Sync>,
                counters: store as Arc<dyn CounterStore + Send + Sync>,
            }
        }
        StoreBackend::File => {
            tracing::info!(data_dir = %config.store.data_dir, "Creating file table store");
            let store = Arc::new(FileTableStore::open(&config.store.data_dir).await?);
            StoreHandles {
                tables: store.clone() as Arc<dyn KeyValueStore + Send + Sync>,
                counters: store as Arc<dyn CounterStore + Send + Sync>,
            }
        }
    };

    handles
        .tables
        .ensure_table(&config.pipeline.checkpoint_table())
        .await?;
    handles
        .tables
        .ensure_table(&config.pipeline.target_table())
        .await?;

    Ok(handles)
}
