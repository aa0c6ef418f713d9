//! Batched durable writer
//!
//! Items are written in chunks of at most 25. The store may report part of a
//! chunk as unprocessed; exactly that subset is resubmitted after an
//! exponential backoff, up to `max_attempts` submissions per chunk.

use crate::adapters::store::{KeyValueStore, MAX_BATCH_WRITE_ITEMS};
use crate::config::WriterConfig;
use crate::domain::{Item, Result, TripstreamError};
use crate::log_retry_attempt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Settings for a [`BatchWriter`]
#[derive(Debug, Clone)]
pub struct WriterSettings {
    /// Items per submission (1-25)
    pub chunk_size: usize,
    /// Submissions per chunk before giving up
    pub max_attempts: usize,
    /// Delay before the first resubmission
    pub initial_delay: Duration,
    /// Upper bound on any delay
    pub max_delay: Duration,
    /// Factor applied to the delay after each resubmission
    pub backoff_multiplier: f64,
    /// Skip submission and report everything as written
    pub dry_run: bool,
}

impl WriterSettings {
    /// Settings from the `[writer]` config section
    pub fn from_config(config: &WriterConfig, dry_run: bool) -> Self {
        Self {
            chunk_size: config.chunk_size.clamp(1, MAX_BATCH_WRITE_ITEMS),
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            dry_run,
        }
    }

    /// Delay before resubmission number `retry` (1-based)
    fn delay_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as usize) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self::from_config(&WriterConfig::default(), false)
    }
}

/// Outcome of a successful [`BatchWriter::write_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Items confirmed written
    pub items_written: usize,
    /// Chunks the items were split into
    pub chunks: usize,
    /// `batch_write` calls made, retries included
    pub submissions: usize,
    /// Item resubmissions across all chunks
    pub retried_items: usize,
}

/// Writes items to a table with bounded retry of unprocessed items
pub struct BatchWriter {
    store: Arc<dyn KeyValueStore + Send + Sync>,
    settings: WriterSettings,
}

impl BatchWriter {
    /// Create a writer over a store
    pub fn new(store: Arc<dyn KeyValueStore + Send + Sync>, settings: WriterSettings) -> Self {
        Self { store, settings }
    }

    /// Writer settings
    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Write every item, retrying unprocessed subsets
    ///
    /// # Errors
    ///
    /// Returns `WriteRetryExhaustion` when a chunk still has unprocessed items
    /// after `max_attempts` submissions. Its `unwritten` list holds those items
    /// followed by every item of the chunks that were never submitted. A store
    /// error on any submission is returned as is.
    pub async fn write_all(&self, table: &str, items: Vec<Item>) -> Result<WriteResult> {
        let mut result = WriteResult::default();

        if items.is_empty() {
            return Ok(result);
        }

        if self.settings.dry_run {
            tracing::info!(
                table = table,
                items = items.len(),
                "Dry run: skipping batch write"
            );
            result.items_written = items.len();
            return Ok(result);
        }

        let chunk_size = self.settings.chunk_size.clamp(1, MAX_BATCH_WRITE_ITEMS);
        let mut remaining = items;
        let total = remaining.len();

        while !remaining.is_empty() {
            let rest = remaining.split_off(chunk_size.min(remaining.len()));
            let chunk = std::mem::replace(&mut remaining, rest);
            result.chunks += 1;

            tracing::debug!(
                table = table,
                chunk = result.chunks,
                chunk_items = chunk.len(),
                written = result.items_written,
                total = total,
                "Submitting chunk"
            );

            if let Err(unwritten) = self.write_chunk(table, chunk, &mut result).await? {
                let attempts = self.settings.max_attempts;
                let mut unwritten = unwritten;
                unwritten.extend(remaining);

                tracing::error!(
                    table = table,
                    attempts = attempts,
                    unwritten = unwritten.len(),
                    "Write retries exhausted"
                );
                return Err(TripstreamError::WriteRetryExhaustion {
                    attempts,
                    unwritten,
                });
            }
        }

        tracing::info!(
            table = table,
            items_written = result.items_written,
            chunks = result.chunks,
            submissions = result.submissions,
            retried_items = result.retried_items,
            "Batch write complete"
        );

        Ok(result)
    }

    /// Submit one chunk until it is fully processed or attempts run out
    ///
    /// The inner `Err` carries the items still unprocessed after the last
    /// attempt.
    async fn write_chunk(
        &self,
        table: &str,
        chunk: Vec<Item>,
        result: &mut WriteResult,
    ) -> Result<std::result::Result<(), Vec<Item>>> {
        let mut pending = chunk;
        let mut attempt = 1;

        loop {
            let submitted = pending.len();
            let unprocessed = self.store.batch_write(table, pending).await?;
            result.submissions += 1;
            result.items_written += submitted.saturating_sub(unprocessed.len());

            if unprocessed.is_empty() {
                return Ok(Ok(()));
            }
            if attempt >= self.settings.max_attempts {
                return Ok(Err(unprocessed));
            }

            let delay = self.settings.delay_for(attempt);
            log_retry_attempt!(
                attempt,
                self.settings.max_attempts,
                format!("{} item(s) unprocessed", unprocessed.len())
            );
            sleep(delay).await;

            result.retried_items += unprocessed.len();
            pending = unprocessed;
            attempt += 1;
        }
    }
}
