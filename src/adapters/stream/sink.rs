//! Stream sinks
//!
//! The publisher puts one message per snapshot row. The file sink writes
//! everything put so far as a [`DeliveryBatch`], which `consume --event`
//! reads back.

use super::envelope::{DeliveryBatch, DeliveryRecord, StreamPayload};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Destination for published messages
#[async_trait]
pub trait StreamSink: Send + Sync {
    /// Put one message on the stream
    async fn put_record(&self, partition_key: &str, data: Vec<u8>) -> Result<()>;
}

/// A message as it was put
#[derive(Debug, Clone, PartialEq)]
pub struct PutRecord {
    pub partition_key: String,
    pub data: Vec<u8>,
}

/// Sink that keeps messages in memory
#[derive(Debug, Default)]
pub struct MemoryStreamSink {
    records: Mutex<Vec<PutRecord>>,
}

impl MemoryStreamSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages put so far
    pub async fn records(&self) -> Vec<PutRecord> {
        self.records.lock().await.clone()
    }

    /// Take every message put so far as one delivery batch
    pub async fn drain_batch(&self) -> DeliveryBatch {
        let records = std::mem::take(&mut *self.records.lock().await);
        batch_of(&records)
    }
}

#[async_trait]
impl StreamSink for MemoryStreamSink {
    async fn put_record(&self, partition_key: &str, data: Vec<u8>) -> Result<()> {
        self.records.lock().await.push(PutRecord {
            partition_key: partition_key.to_string(),
            data,
        });
        Ok(())
    }
}

/// Sink that rewrites a delivery batch file after every message
#[derive(Debug)]
pub struct FileStreamSink {
    path: PathBuf,
    records: Mutex<Vec<PutRecord>>,
}

impl FileStreamSink {
    /// Create a sink writing to `path`; any existing batch there is replaced
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Path of the delivery batch file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StreamSink for FileStreamSink {
    async fn put_record(&self, partition_key: &str, data: Vec<u8>) -> Result<()> {
        let mut records = self.records.lock().await;
        records.push(PutRecord {
            partition_key: partition_key.to_string(),
            data,
        });

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&batch_of(&records))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

fn batch_of(records: &[PutRecord]) -> DeliveryBatch {
    let records = records
        .iter()
        .enumerate()
        .map(|(index, record)| DeliveryRecord {
            kinesis: StreamPayload {
                partition_key: Some(record.partition_key.clone()),
                sequence_number: Some(index.to_string()),
                data: STANDARD.encode(&record.data),
            },
        })
        .collect();
    DeliveryBatch { records }
}
