//! External system integrations for tripstream.
//!
//! This module provides local stand-ins for the systems the pipeline talks to:
//!
//! - [`store`] - Key-value tables and ID counters (memory or JSON files)
//! - [`snapshot`] - Object storage for source datasets and snapshots
//! - [`stream`] - Stream sink and delivery envelope
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: the core only sees the traits
//! ([`store::KeyValueStore`], [`store::CounterStore`],
//! [`snapshot::SnapshotStore`], [`stream::StreamSink`]), so tests run
//! against the in-memory implementations.
//!
//! ```rust
//! use tripstream::adapters::store::{KeyValueStore, MemoryTableStore};
//!
//! # async fn example() -> tripstream::domain::Result<()> {
//! let store = MemoryTableStore::new();
//! store.ensure_table("FhvTable").await?;
//! let page = store.scan_page("FhvTable", Some(&["ID"][..]), None, 100).await?;
//! assert!(page.items.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod snapshot;
pub mod store;
pub mod stream;
