//! Integration tests for the batched durable writer

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tripstream::adapters::store::{KeyValueStore, MemoryTableStore, ScanPage};
use tripstream::core::ingest::{BatchWriter, WriterSettings};
use tripstream::domain::{AttributeValue, Item, Result, StoreError, TripstreamError, ID_ATTRIBUTE};

/// Reports the last two items of a submission as unprocessed the first time
/// it sees them
struct TailRejectingStore {
    inner: MemoryTableStore,
    seen: Mutex<HashSet<u64>>,
    submissions: Mutex<Vec<Vec<u64>>>,
    accepted: Mutex<Vec<u64>>,
}

impl TailRejectingStore {
    async fn new() -> Self {
        Self {
            inner: MemoryTableStore::with_tables(&["T"]).await,
            seen: Mutex::new(HashSet::new()),
            submissions: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
        }
    }
}

fn id_of(item: &Item) -> u64 {
    item[ID_ATTRIBUTE].as_u64().unwrap()
}

#[async_trait]
impl KeyValueStore for TailRejectingStore {
    async fn ensure_table(&self, table: &str) -> Result<()> {
        self.inner.ensure_table(table).await
    }

    async fn scan_page(
        &self,
        table: &str,
        projection: Option<&[&str]>,
        start_key: Option<&Item>,
        limit: usize,
    ) -> Result<ScanPage> {
        self.inner.scan_page(table, projection, start_key, limit).await
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        let ids: Vec<u64> = items.iter().map(id_of).collect();
        self.submissions.lock().await.push(ids.clone());

        let mut seen = self.seen.lock().await;
        let tail_start = items.len().saturating_sub(2);
        let (mut accepted, mut rejected) = (Vec::new(), Vec::new());
        for (index, item) in items.into_iter().enumerate() {
            let first_sight = !seen.contains(&id_of(&item));
            if index >= tail_start && first_sight {
                rejected.push(item);
            } else {
                accepted.push(item);
            }
        }
        seen.extend(ids);

        self.accepted
            .lock()
            .await
            .extend(accepted.iter().map(id_of));
        let unprocessed = self.inner.batch_write(table, accepted).await?;
        assert!(unprocessed.is_empty());
        Ok(rejected)
    }
}

/// Never processes anything
struct ThrottledStore;

#[async_trait]
impl KeyValueStore for ThrottledStore {
    async fn ensure_table(&self, _table: &str) -> Result<()> {
        Ok(())
    }

    async fn scan_page(
        &self,
        _table: &str,
        _projection: Option<&[&str]>,
        _start_key: Option<&Item>,
        _limit: usize,
    ) -> Result<ScanPage> {
        Ok(ScanPage::default())
    }

    async fn batch_write(&self, _table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        Ok(items)
    }
}

/// Fails every write outright
struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn ensure_table(&self, _table: &str) -> Result<()> {
        Ok(())
    }

    async fn scan_page(
        &self,
        _table: &str,
        _projection: Option<&[&str]>,
        _start_key: Option<&Item>,
        _limit: usize,
    ) -> Result<ScanPage> {
        Ok(ScanPage::default())
    }

    async fn batch_write(&self, table: &str, _items: Vec<Item>) -> Result<Vec<Item>> {
        Err(StoreError::WriteFailed(format!("{table} is read-only")).into())
    }
}

fn items(count: u64) -> Vec<Item> {
    (1..=count)
        .map(|id| {
            Item::from([
                (ID_ATTRIBUTE.to_string(), AttributeValue::n(id)),
                ("fare_amount".to_string(), AttributeValue::n(id as f64 * 1.5)),
            ])
        })
        .collect()
}

fn fast_settings(max_attempts: usize) -> WriterSettings {
    WriterSettings {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        ..WriterSettings::default()
    }
}

#[tokio::test]
async fn test_resubmits_exactly_the_unprocessed_items() {
    let store = Arc::new(TailRejectingStore::new().await);
    let writer = BatchWriter::new(store.clone(), fast_settings(5));

    let result = writer.write_all("T", items(57)).await.unwrap();

    assert_eq!(result.items_written, 57);
    assert_eq!(result.chunks, 3);
    assert_eq!(result.submissions, 6);
    assert_eq!(result.retried_items, 6);

    let submissions = store.submissions.lock().await.clone();
    let sizes: Vec<usize> = submissions.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![25, 2, 25, 2, 7, 2]);
    assert_eq!(submissions[1], vec![24, 25]);
    assert_eq!(submissions[3], vec![49, 50]);
    assert_eq!(submissions[5], vec![56, 57]);

    let accepted = store.accepted.lock().await.clone();
    let unique: HashSet<u64> = accepted.iter().copied().collect();
    assert_eq!(accepted.len(), 57);
    assert_eq!(unique, (1..=57).collect::<HashSet<u64>>());
    assert_eq!(store.inner.item_count("T").await, 57);
}

#[tokio::test]
async fn test_sustained_throttling_exhausts_retries() {
    let writer = BatchWriter::new(Arc::new(ThrottledStore), fast_settings(3));

    let err = writer.write_all("T", items(57)).await.unwrap_err();

    match err {
        TripstreamError::WriteRetryExhaustion {
            attempts,
            unwritten,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(unwritten.len(), 57);
            let ids: Vec<u64> = unwritten.iter().map(id_of).collect();
            assert_eq!(ids, (1..=57).collect::<Vec<u64>>());
        }
        other => panic!("expected WriteRetryExhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let writer = BatchWriter::new(Arc::new(FailingStore), fast_settings(3));
    let err = writer.write_all("T", items(3)).await.unwrap_err();
    assert!(matches!(
        err,
        TripstreamError::Store(StoreError::WriteFailed(_))
    ));
}

#[tokio::test]
async fn test_small_chunk_size() {
    let store = Arc::new(MemoryTableStore::with_tables(&["T"]).await);
    let settings = WriterSettings {
        chunk_size: 4,
        ..fast_settings(2)
    };
    let writer = BatchWriter::new(store.clone(), settings);

    let result = writer.write_all("T", items(10)).await.unwrap();
    assert_eq!(result.chunks, 3);
    assert_eq!(store.item_count("T").await, 10);
}
