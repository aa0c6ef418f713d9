//! Key-value store layer
//!
//! Checkpoint and target tables are reached through [`KeyValueStore`];
//! sequential-ID counters through [`CounterStore`]. Both local backends
//! implement both traits.

pub mod factory;
pub mod file;
pub mod memory;
pub mod traits;

pub use factory::{create_store, StoreHandles};
pub use file::FileTableStore;
pub use memory::MemoryTableStore;
pub use traits::{CounterStore, KeyValueStore, ScanPage, MAX_BATCH_WRITE_ITEMS};
