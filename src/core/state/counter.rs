//! Counter-based sequential ID allocation
//!
//! The highest issued identifier lives in an explicit counter entity that is
//! advanced by compare-and-swap, so concurrent invocations never receive
//! overlapping runs. The first allocation seeds the counter from a scan of
//! the target table.

use super::allocator::{IdAllocator, ScanAllocator};
use super::watermark::IdRun;
use crate::adapters::store::CounterStore;
use crate::domain::{Result, TripstreamError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use std::sync::Arc;

/// Allocator backed by a compare-and-swap counter
pub struct CounterAllocator {
    counters: Arc<dyn CounterStore + Send + Sync>,
    counter_name: String,
    seed: ScanAllocator,
    max_attempts: usize,
}

impl CounterAllocator {
    /// Create a counter allocator
    ///
    /// # Arguments
    ///
    /// * `counters` - Store holding the counter
    /// * `counter_name` - Name of the counter entity
    /// * `seed` - Scan allocator used to initialise a counter that doesn't exist yet
    /// * `max_attempts` - Compare-and-swap attempts before giving up
    pub fn new(
        counters: Arc<dyn CounterStore + Send + Sync>,
        counter_name: impl Into<String>,
        seed: ScanAllocator,
        max_attempts: usize,
    ) -> Self {
        Self {
            counters,
            counter_name: counter_name.into(),
            seed,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Counter name
    pub fn counter_name(&self) -> &str {
        &self.counter_name
    }
}

#[async_trait]
impl IdAllocator for CounterAllocator {
    async fn next_id(&self) -> Result<u64> {
        match self.counters.read_counter(&self.counter_name).await? {
            Some(value) => Ok(value),
            None => self.seed.next_id().await,
        }
    }

    async fn allocate_run(&self, count: usize) -> Result<IdRun> {
        for attempt in 1..=self.max_attempts {
            let current = self.counters.read_counter(&self.counter_name).await?;
            let base = match current {
                Some(value) => value,
                None => self.seed.next_id().await?,
            };

            let run = IdRun::after(base, count)?;
            let Some(new_value) = run.last() else {
                return Ok(run);
            };

            if self
                .counters
                .compare_and_swap(&self.counter_name, current, new_value)
                .await?
            {
                tracing::info!(
                    counter = %self.counter_name,
                    start = run.start(),
                    count = run.len(),
                    attempt = attempt,
                    "Allocated ID run"
                );
                return Ok(run);
            }

            log_retry_attempt!(
                attempt,
                self.max_attempts,
                format!("counter {} changed concurrently", self.counter_name)
            );
        }

        Err(TripstreamError::Allocation(format!(
            "counter {} still contended after {} attempts",
            self.counter_name, self.max_attempts
        )))
    }
}
