//! In-memory snapshot store

use super::traits::SnapshotStore;
use crate::domain::{Result, SourceRow, TripstreamError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Objects held in a map, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    objects: Mutex<HashMap<String, Vec<SourceRow>>>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an object directly
    pub async fn insert(&self, name: &str, rows: Vec<SourceRow>) {
        self.objects.lock().await.insert(name.to_string(), rows);
    }

    /// Whether an object exists
    pub async fn contains(&self, name: &str) -> bool {
        self.objects.lock().await.contains_key(name)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read_rows(&self, name: &str) -> Result<Vec<SourceRow>> {
        self.objects
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| TripstreamError::UpstreamRead(format!("object not found: {name}")))
    }

    async fn write_rows(&self, name: &str, rows: &[SourceRow]) -> Result<()> {
        self.objects
            .lock()
            .await
            .insert(name.to_string(), rows.to_vec());
        Ok(())
    }
}
