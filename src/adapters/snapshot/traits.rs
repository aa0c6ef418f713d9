//! Snapshot store abstraction
//!
//! Stands in for the object storage bucket holding the bulk source dataset
//! and the sampled snapshot artifacts.

use crate::domain::{Result, SourceRow};
use async_trait::async_trait;

/// Named tabular objects, read and written whole
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read every row of an object, in stored order
    ///
    /// An object with no rows yields an empty vector; callers decide whether
    /// that is an error.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if the object is missing or unreadable.
    async fn read_rows(&self, name: &str) -> Result<Vec<SourceRow>>;

    /// Replace an object with the given rows
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be written.
    async fn write_rows(&self, name: &str, rows: &[SourceRow]) -> Result<()>;
}
