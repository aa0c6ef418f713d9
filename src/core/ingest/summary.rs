//! Consumer invocation summary

use super::writer::WriteResult;
use crate::domain::TripCategory;
use std::time::Duration;

/// An event dropped under the `skip` malformed policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    /// Position of the event in its delivery batch
    pub sequence: usize,

    /// Why it was dropped
    pub message: String,
}

/// Summary of one consumer invocation
#[derive(Debug, Clone)]
pub struct ConsumeSummary {
    /// Category consumed
    pub category: TripCategory,

    /// Target table written
    pub target_table: String,

    /// Records in the delivery batch
    pub received: usize,

    /// Records transformed and handed to the writer
    pub transformed: usize,

    /// Events dropped as malformed
    pub skipped: Vec<SkippedEvent>,

    /// First and last ID assigned, if any record was written
    pub id_range: Option<(u64, u64)>,

    /// Writer accounting
    pub write: WriteResult,

    /// Duration of the invocation
    pub duration: Duration,
}

impl ConsumeSummary {
    /// Create an empty summary
    pub fn new(category: TripCategory, target_table: impl Into<String>, received: usize) -> Self {
        Self {
            category,
            target_table: target_table.into(),
            received,
            transformed: 0,
            skipped: Vec::new(),
            id_range: None,
            write: WriteResult::default(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record a skipped event
    pub fn add_skipped(&mut self, sequence: usize, message: impl Into<String>) {
        self.skipped.push(SkippedEvent {
            sequence,
            message: message.into(),
        });
    }

    /// Response body for a successful invocation
    pub fn message(&self) -> String {
        match self.id_range {
            Some((first, last)) => format!(
                "Data successfully written to {}: {} record(s), IDs {first}-{last}.",
                self.target_table, self.write.items_written
            ),
            None => format!("No records to write to {}.", self.target_table),
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            category = %self.category,
            table = %self.target_table,
            received = self.received,
            transformed = self.transformed,
            skipped = self.skipped.len(),
            written = self.write.items_written,
            retried_items = self.write.retried_items,
            duration_ms = self.duration.as_millis() as u64,
            "Consume completed"
        );

        for skipped in &self.skipped {
            tracing::warn!(
                sequence = skipped.sequence,
                message = %skipped.message,
                "Skipped malformed event"
            );
        }
    }
}
