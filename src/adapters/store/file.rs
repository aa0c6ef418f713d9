//! File-backed key-value store
//!
//! Each table is a JSON array of items in `<data_dir>/<table>.json`; counters
//! live in `<data_dir>/_counters.json`. Every write is applied to a copy,
//! persisted, and only then swapped into the cache, so the cache never
//! holds state that is not on disk.

use super::memory::{check_batch_size, Table};
use super::traits::{CounterStore, KeyValueStore, ScanPage};
use crate::domain::{Item, Result, StoreError, TripstreamError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const COUNTERS_FILE: &str = "_counters.json";

/// Key-value store persisted as JSON files
#[derive(Debug)]
pub struct FileTableStore {
    data_dir: PathBuf,
    tables: Mutex<HashMap<String, Table>>,
    counters: Mutex<Option<HashMap<String, u64>>>,
}

impl FileTableStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the directory cannot be created.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir).await.map_err(|e| {
            StoreError::Backend(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        tracing::debug!(data_dir = %data_dir.display(), "Opened file table store");

        Ok(Self {
            data_dir,
            tables: Mutex::new(HashMap::new()),
            counters: Mutex::new(None),
        })
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.json"))
    }

    /// Load a table into the cache if it isn't there yet
    async fn load_table<'a>(
        &self,
        tables: &'a mut HashMap<String, Table>,
        table: &str,
    ) -> Result<&'a mut Table> {
        if !tables.contains_key(table) {
            let path = self.table_path(table);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(StoreError::TableNotFound(table.to_string()).into());
            }
            let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
                StoreError::Backend(format!("failed to read {}: {e}", path.display()))
            })?;
            let items: Vec<Item> = serde_json::from_str(&content).map_err(|e| {
                StoreError::Backend(format!("corrupt table file {}: {e}", path.display()))
            })?;
            tables.insert(table.to_string(), Table::from_items(items)?);
        }

        tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()).into())
    }

    async fn persist_table(&self, table: &str, contents: &Table) -> Result<()> {
        let path = self.table_path(table);
        let json = serde_json::to_string(contents.items())?;
        tokio::fs::write(&path, json).await.map_err(|e| {
            StoreError::Backend(format!("failed to write {}: {e}", path.display()))
        })?;
        Ok(())
    }

    async fn load_counters<'a>(
        &self,
        counters: &'a mut Option<HashMap<String, u64>>,
    ) -> Result<&'a mut HashMap<String, u64>> {
        if counters.is_none() {
            let path = self.data_dir.join(COUNTERS_FILE);
            let loaded = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                let content = tokio::fs::read_to_string(&path).await?;
                serde_json::from_str(&content).map_err(|e| {
                    StoreError::Backend(format!("corrupt counters file {}: {e}", path.display()))
                })?
            } else {
                HashMap::new()
            };
            *counters = Some(loaded);
        }
        Ok(counters.get_or_insert_with(HashMap::new))
    }
}

#[async_trait]
impl KeyValueStore for FileTableStore {
    async fn ensure_table(&self, table: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        match self.load_table(&mut tables, table).await {
            Ok(_) => return Ok(()),
            Err(TripstreamError::Store(StoreError::TableNotFound(_))) => {}
            Err(e) => return Err(e),
        }

        tracing::info!(table = table, "Creating table");
        let empty = Table::default();
        self.persist_table(table, &empty).await?;
        tables.insert(table.to_string(), empty);
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &str,
        projection: Option<&[&str]>,
        start_key: Option<&Item>,
        limit: usize,
    ) -> Result<ScanPage> {
        let mut tables = self.tables.lock().await;
        let target = self.load_table(&mut tables, table).await?;
        Ok(target.page(projection, start_key, limit)?)
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        check_batch_size(&items)?;

        let mut tables = self.tables.lock().await;
        let target = self.load_table(&mut tables, table).await?;
        let mut updated = target.clone();
        for item in items {
            updated.upsert(item)?;
        }
        self.persist_table(table, &updated).await?;
        *target = updated;
        Ok(Vec::new())
    }
}

#[async_trait]
impl CounterStore for FileTableStore {
    async fn read_counter(&self, name: &str) -> Result<Option<u64>> {
        let mut guard = self.counters.lock().await;
        let counters = self.load_counters(&mut guard).await?;
        Ok(counters.get(name).copied())
    }

    async fn compare_and_swap(&self, name: &str, expected: Option<u64>, new: u64) -> Result<bool> {
        let mut guard = self.counters.lock().await;
        let counters = self.load_counters(&mut guard).await?;
        if counters.get(name).copied() != expected {
            return Ok(false);
        }
        let mut updated = counters.clone();
        updated.insert(name.to_string(), new);

        let json = serde_json::to_string(&updated)?;
        let path = self.data_dir.join(COUNTERS_FILE);
        tokio::fs::write(&path, json).await.map_err(|e| {
            StoreError::Backend(format!("failed to write {}: {e}", path.display()))
        })?;
        *counters = updated;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttributeValue, ID_ATTRIBUTE};
    use tempfile::TempDir;

    fn item(id: &str) -> Item {
        Item::from([(ID_ATTRIBUTE.to_string(), AttributeValue::s(id))])
    }

    #[tokio::test]
    async fn test_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();

        let store = FileTableStore::open(dir.path()).await.unwrap();
        store.ensure_table("FhvCheckPoint").await.unwrap();
        store
            .batch_write("FhvCheckPoint", vec![item("a"), item("b")])
            .await
            .unwrap();
        drop(store);

        let reopened = FileTableStore::open(dir.path()).await.unwrap();
        let page = reopened
            .scan_page("FhvCheckPoint", None, None, 100)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0][ID_ATTRIBUTE].as_str(), "a");
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileTableStore::open(dir.path()).await.unwrap();
        let err = store.batch_write("Nope", vec![item("a")]).await.unwrap_err();
        assert!(matches!(
            err,
            TripstreamError::Store(StoreError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_cache_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = FileTableStore::open(dir.path()).await.unwrap();
        store.ensure_table("FhvTable").await.unwrap();
        store.batch_write("FhvTable", vec![item("a")]).await.unwrap();

        // A directory in place of the table file makes the next write fail
        let path = dir.path().join("FhvTable.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = store.batch_write("FhvTable", vec![item("b")]).await.unwrap_err();
        assert!(matches!(err, TripstreamError::Store(StoreError::Backend(_))));

        let page = store.scan_page("FhvTable", None, None, 100).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0][ID_ATTRIBUTE].as_str(), "a");
    }

    #[tokio::test]
    async fn test_failed_counter_persist_keeps_old_value() {
        let dir = TempDir::new().unwrap();
        let store = FileTableStore::open(dir.path()).await.unwrap();
        assert!(store.compare_and_swap("fhv", None, 5).await.unwrap());

        let path = dir.path().join(COUNTERS_FILE);
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.compare_and_swap("fhv", Some(5), 9).await.is_err());
        assert_eq!(store.read_counter("fhv").await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn test_counters_persist() {
        let dir = TempDir::new().unwrap();
        let store = FileTableStore::open(dir.path()).await.unwrap();
        assert!(store.compare_and_swap("fhv", None, 12).await.unwrap());
        drop(store);

        let reopened = FileTableStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.read_counter("fhv").await.unwrap(), Some(12));
        assert!(!reopened.compare_and_swap("fhv", Some(11), 13).await.unwrap());
    }
}
