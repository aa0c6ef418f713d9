//! Stream consumer
//!
//! One invocation decodes a delivery batch, transforms every event, allocates
//! a single gap-free ID run and writes the items. Any failure fails the whole
//! invocation; there is no partial acknowledgment.

use super::summary::ConsumeSummary;
use super::writer::{BatchWriter, WriterSettings};
use crate::adapters::store::StoreHandles;
use crate::adapters::stream::DeliveryBatch;
use crate::config::{MalformedPolicy, TripstreamConfig};
use crate::core::state::{create_allocator, IdAllocator};
use crate::core::transform::{LookupTables, PendingRecord, RecordTransformer};
use crate::domain::{Result, TripstreamError};
use crate::{log_error_with_context, log_run_complete, log_run_start};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Status returned to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Consumes delivery batches for one category
pub struct StreamConsumer {
    transformer: RecordTransformer,
    allocator: Arc<dyn IdAllocator + Send + Sync>,
    writer: BatchWriter,
    target_table: String,
    malformed_policy: MalformedPolicy,
}

impl StreamConsumer {
    /// Create a consumer from its parts
    pub fn new(
        transformer: RecordTransformer,
        allocator: Arc<dyn IdAllocator + Send + Sync>,
        writer: BatchWriter,
        target_table: impl Into<String>,
        malformed_policy: MalformedPolicy,
    ) -> Self {
        Self {
            transformer,
            allocator,
            writer,
            target_table: target_table.into(),
            malformed_policy,
        }
    }

    /// Create a consumer wired from configuration
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the lookup overrides are invalid.
    pub fn from_config(config: &TripstreamConfig, handles: &StoreHandles) -> Result<Self> {
        let lookups = LookupTables::with_overrides(&config.lookups)?;
        let transformer = RecordTransformer::new(config.pipeline.category, lookups)?;
        let writer = BatchWriter::new(
            handles.tables.clone(),
            WriterSettings::from_config(&config.writer, config.application.dry_run),
        );

        Ok(Self::new(
            transformer,
            create_allocator(config, handles),
            writer,
            config.pipeline.target_table(),
            config.consumer.malformed_policy,
        ))
    }

    /// Target table name
    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    /// Handle one invocation, turning every outcome into a status
    pub async fn handle(&self, batch: &DeliveryBatch) -> InvocationResponse {
        match self.process(batch).await {
            Ok(summary) => InvocationResponse::ok(summary.message()),
            Err(e) => {
                log_error_with_context!(&e, "Consume invocation failed");
                InvocationResponse::error(e.to_string())
            }
        }
    }

    /// Process one delivery batch
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` for the first bad event under the `abort`
    /// policy, and any allocation or write failure. Nothing is written when
    /// an event aborts the invocation.
    pub async fn process(&self, batch: &DeliveryBatch) -> Result<ConsumeSummary> {
        let start = Instant::now();
        let category = self.transformer.category();
        log_run_start!("consume", category);

        let mut summary = ConsumeSummary::new(category, &self.target_table, batch.len());
        let mut pending: Vec<PendingRecord> = Vec::with_capacity(batch.len());

        for index in 0..batch.len() {
            let outcome = batch
                .decode(index)
                .and_then(|event| self.transformer.transform(&event));

            match outcome {
                Ok(record) => pending.push(record),
                Err(TripstreamError::MalformedRecord(message))
                    if self.malformed_policy == MalformedPolicy::Skip =>
                {
                    tracing::warn!(sequence = index, error = %message, "Dropping malformed event");
                    summary.add_skipped(index, message);
                }
                Err(e) => return Err(e),
            }
        }

        summary.transformed = pending.len();

        if !pending.is_empty() {
            let run = self.allocator.allocate_run(pending.len()).await?;
            summary.id_range = run.last().map(|last| (run.start(), last));

            let items = pending
                .into_iter()
                .zip(run.ids())
                .map(|(record, id)| record.with_id(id).to_item())
                .collect();

            summary.write = self.writer.write_all(&self.target_table, items).await?;
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        log_run_complete!("consume", summary.write.items_written, summary.duration);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryTableStore;
    use crate::core::state::ScanAllocator;
    use crate::domain::TripCategory;

    #[test]
    fn test_response_wire_format() {
        let response = InvocationResponse::error("boom");
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":500,"body":"boom"}"#
        );
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_empty_batch_allocates_nothing() {
        let store = Arc::new(MemoryTableStore::with_tables(&["FhvTable"]).await);
        let consumer = StreamConsumer::new(
            RecordTransformer::new(TripCategory::Fhv, LookupTables::defaults()).unwrap(),
            Arc::new(ScanAllocator::new(store.clone(), "FhvTable", 10)),
            BatchWriter::new(store.clone(), WriterSettings::default()),
            "FhvTable",
            MalformedPolicy::Abort,
        );

        let batch = DeliveryBatch::from_messages("1", &[]);
        let response = consumer.handle(&batch).await;
        assert!(response.is_success());
        assert_eq!(response.body, "No records to write to FhvTable.");
        assert_eq!(store.item_count("FhvTable").await, 0);
    }
}
