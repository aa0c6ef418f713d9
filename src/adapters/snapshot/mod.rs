//! Snapshot object storage
//!
//! Bulk source datasets and sampled snapshots are tabular objects read and
//! written whole through [`SnapshotStore`].

pub mod local;
pub mod memory;
pub mod traits;

pub use local::LocalSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use traits::SnapshotStore;
