//! Snapshot publisher
//!
//! Puts every row of the latest snapshot artifact on the stream as one JSON
//! object message, all under the same partition key.

use crate::adapters::snapshot::SnapshotStore;
use crate::adapters::stream::StreamSink;
use crate::config::TripstreamConfig;
use crate::domain::{Result, TripCategory, TripstreamError};
use crate::{log_run_complete, log_run_start};
use std::sync::Arc;
use std::time::Instant;

/// Publishes a snapshot artifact to a stream sink
pub struct SnapshotPublisher {
    category: TripCategory,
    snapshots: Arc<dyn SnapshotStore + Send + Sync>,
    sink: Arc<dyn StreamSink + Send + Sync>,
    snapshot_name: String,
    partition_key: String,
    dry_run: bool,
}

impl SnapshotPublisher {
    /// Create a publisher wired from configuration
    pub fn from_config(
        config: &TripstreamConfig,
        snapshots: Arc<dyn SnapshotStore + Send + Sync>,
        sink: Arc<dyn StreamSink + Send + Sync>,
    ) -> Self {
        Self {
            category: config.pipeline.category,
            snapshots,
            sink,
            snapshot_name: config.pipeline.snapshot_name(),
            partition_key: config.stream.partition_key.clone(),
            dry_run: config.application.dry_run,
        }
    }

    /// Publish the snapshot, returning the number of messages put
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if the snapshot cannot be read, `EmptySource`
    /// if it has no rows, and any sink failure.
    pub async fn publish(&self) -> Result<usize> {
        let start = Instant::now();
        log_run_start!("publish", self.category);

        let rows = self.snapshots.read_rows(&self.snapshot_name).await?;
        if rows.is_empty() {
            return Err(TripstreamError::EmptySource(self.snapshot_name.clone()));
        }

        if self.dry_run {
            tracing::info!(rows = rows.len(), "Dry run: skipping stream puts");
            return Ok(rows.len());
        }

        for (index, row) in rows.iter().enumerate() {
            let data = serde_json::to_vec(row.fields())?;
            self.sink.put_record(&self.partition_key, data).await?;
            tracing::debug!(message = index, partition_key = %self.partition_key, "Put record");
        }

        log_run_complete!("publish", rows.len(), start.elapsed());
        Ok(rows.len())
    }
}
