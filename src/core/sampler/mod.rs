//! Deduplicating sampler
//!
//! Each run draws a sample size, selects that many never-seen rows from the
//! bulk source, writes them to the snapshot artifact and then appends them to
//! the checkpoint. The two writes are not transactional; writing the snapshot
//! first means a crash in between re-delivers rows rather than losing them.

pub mod dedup;

pub use dedup::select_candidates;

use crate::adapters::snapshot::SnapshotStore;
use crate::adapters::store::StoreHandles;
use crate::config::{DedupPolicy, TripstreamConfig};
use crate::core::checkpoint::CheckpointStore;
use crate::core::ingest::writer::{BatchWriter, WriterSettings};
use crate::domain::{
    CheckpointRecord, NormalizedRow, Result, SourceRow, TripCategory, TripstreamError,
    ID_ATTRIBUTE,
};
use crate::{log_run_complete, log_run_start};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;

/// Rows selected by one sampler run
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    /// Selected rows with their fresh checkpoint keys
    pub records: Vec<CheckpointRecord>,

    /// Sample size that was drawn
    pub requested: usize,

    /// Candidates available before truncation
    pub candidates: usize,

    /// Whether the checkpoint was empty, skipping dedup
    pub checkpoint_was_empty: bool,
}

impl SampleBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot rows: the normalized columns without the checkpoint key
    pub fn snapshot_rows(&self) -> Vec<SourceRow> {
        self.records
            .iter()
            .map(|record| record.row.to_source_row())
            .collect()
    }
}

/// Select up to `n` rows to sample
///
/// An empty checkpoint takes the first `n` source rows as they are; otherwise
/// rows are filtered through [`select_candidates`].
///
/// # Errors
///
/// Returns `EmptySource` if `source` has no rows, and `UpstreamRead` if a
/// source row has an `ID` column, which would collide with the checkpoint key.
pub fn select_batch(
    source: &[SourceRow],
    checkpoint: &[CheckpointRecord],
    n: usize,
    policy: DedupPolicy,
) -> Result<SampleBatch> {
    if source.is_empty() {
        return Err(TripstreamError::EmptySource(
            "source dataset has no rows".to_string(),
        ));
    }

    if let Some(index) = source
        .iter()
        .position(|row| row.fields().contains_key(ID_ATTRIBUTE))
    {
        return Err(TripstreamError::UpstreamRead(format!(
            "source row {} has a column named {ID_ATTRIBUTE}, which is reserved for the checkpoint key",
            index + 1
        )));
    }

    let normalized: Vec<NormalizedRow> = source.iter().map(SourceRow::normalize).collect();

    let candidates = if checkpoint.is_empty() {
        normalized
    } else {
        let seen: Vec<NormalizedRow> = checkpoint.iter().map(|record| record.row.clone()).collect();
        select_candidates(&normalized, &seen, policy)
    };

    let available = candidates.len();
    let records = candidates
        .into_iter()
        .take(n)
        .map(NormalizedRow::into_checkpoint)
        .collect();

    Ok(SampleBatch {
        records,
        requested: n,
        candidates: available,
        checkpoint_was_empty: checkpoint.is_empty(),
    })
}

/// Sampler for one category
pub struct DeduplicatingSampler {
    category: TripCategory,
    snapshots: Arc<dyn SnapshotStore + Send + Sync>,
    checkpoint: CheckpointStore,
    source_name: String,
    snapshot_name: String,
    min_records: usize,
    max_records: usize,
    policy: DedupPolicy,
    dry_run: bool,
}

impl DeduplicatingSampler {
    /// Create a sampler wired from configuration
    pub fn from_config(
        config: &TripstreamConfig,
        handles: &StoreHandles,
        snapshots: Arc<dyn SnapshotStore + Send + Sync>,
    ) -> Self {
        let dry_run = config.application.dry_run;
        let writer = BatchWriter::new(
            handles.tables.clone(),
            WriterSettings::from_config(&config.writer, dry_run),
        );
        let checkpoint = CheckpointStore::new(
            handles.tables.clone(),
            config.pipeline.checkpoint_table(),
            config.store.page_size,
            writer,
        );

        Self {
            category: config.pipeline.category,
            snapshots,
            checkpoint,
            source_name: config.pipeline.source_name(),
            snapshot_name: config.pipeline.snapshot_name(),
            min_records: config.sampler.min_records.min(config.sampler.max_records),
            max_records: config.sampler.max_records.max(config.sampler.min_records),
            policy: config.sampler.dedup_policy,
            dry_run,
        }
    }

    /// Draw a sample size from the configured closed interval
    pub fn draw_size<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min_records..=self.max_records)
    }

    /// Run with a randomly drawn sample size
    pub async fn run(&self) -> Result<SampleBatch> {
        let n = self.draw_size(&mut rand::thread_rng());
        self.run_with_size(n).await
    }

    /// Run with a fixed sample size
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if the source or checkpoint cannot be read in
    /// full, `EmptySource` if the source has no rows, and any write failure.
    pub async fn run_with_size(&self, n: usize) -> Result<SampleBatch> {
        let start = Instant::now();
        log_run_start!("sample", self.category);

        let source = self.snapshots.read_rows(&self.source_name).await?;
        if source.is_empty() {
            return Err(TripstreamError::EmptySource(self.source_name.clone()));
        }
        let checkpoint = self.checkpoint.read_all().await?;

        tracing::info!(
            source = %self.source_name,
            source_rows = source.len(),
            checkpoint_rows = checkpoint.len(),
            sample_size = n,
            "Loaded sampler inputs"
        );

        let batch = select_batch(&source, &checkpoint, n, self.policy)?;

        if self.dry_run {
            tracing::info!(
                selected = batch.len(),
                "Dry run: skipping snapshot and checkpoint writes"
            );
        } else {
            // An exhausted source still replaces the snapshot, so the previous
            // batch cannot be published twice.
            self.snapshots
                .write_rows(&self.snapshot_name, &batch.snapshot_rows())
                .await?;
            tracing::info!(snapshot = %self.snapshot_name, rows = batch.len(), "Snapshot written");

            if batch.is_empty() {
                tracing::info!(candidates = batch.candidates, "No new rows to sample");
            } else {
                self.checkpoint.append(&batch.records).await?;
            }
        }

        log_run_complete!("sample", batch.len(), start.elapsed());
        Ok(batch)
    }
}
