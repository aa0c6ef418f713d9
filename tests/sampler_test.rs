//! Integration tests for the deduplicating sampler

use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tripstream::adapters::snapshot::{MemorySnapshotStore, SnapshotStore};
use tripstream::adapters::store::{MemoryTableStore, StoreHandles};
use tripstream::config::{DedupPolicy, TripstreamConfig};
use tripstream::core::checkpoint::CheckpointStore;
use tripstream::core::ingest::{BatchWriter, WriterSettings};
use tripstream::core::sampler::DeduplicatingSampler;
use tripstream::domain::{SourceRow, TripCategory, TripstreamError, ID_ATTRIBUTE};

struct Fixture {
    config: TripstreamConfig,
    tables: Arc<MemoryTableStore>,
    snapshots: Arc<MemorySnapshotStore>,
}

impl Fixture {
    async fn new(source: Vec<SourceRow>) -> Self {
        let config = TripstreamConfig::for_category(TripCategory::Green);
        let tables = Arc::new(
            MemoryTableStore::with_tables(&["GreenCheckPoint", "GreenTable"]).await,
        );
        let snapshots = Arc::new(MemorySnapshotStore::new());
        snapshots.insert("green_final.jsonl", source).await;
        Self {
            config,
            tables,
            snapshots,
        }
    }

    fn sampler(&self) -> DeduplicatingSampler {
        let handles = StoreHandles {
            tables: self.tables.clone(),
            counters: self.tables.clone(),
        };
        DeduplicatingSampler::from_config(&self.config, &handles, self.snapshots.clone())
    }

    fn checkpoint(&self) -> CheckpointStore {
        let writer = BatchWriter::new(self.tables.clone(), WriterSettings::default());
        CheckpointStore::new(self.tables.clone(), "GreenCheckPoint", 100, writer)
    }
}

fn trip(vendor: u64, fare: f64) -> SourceRow {
    SourceRow::from_value(json!({
        "VendorID": vendor,
        "lpep_pickup_datetime": "2024-03-09 10:00:00",
        "fare_amount": fare,
        "ehail_fee": null
    }))
    .unwrap()
}

fn source(count: u64) -> Vec<SourceRow> {
    (0..count).map(|i| trip(1, 5.0 + i as f64)).collect()
}

#[tokio::test]
async fn test_first_run_takes_source_prefix() {
    let rows = source(20);
    let fixture = Fixture::new(rows.clone()).await;

    let batch = fixture.sampler().run_with_size(6).await.unwrap();

    assert!(batch.checkpoint_was_empty);
    assert_eq!(batch.len(), 6);
    for (record, row) in batch.records.iter().zip(&rows) {
        assert_eq!(record.row, row.normalize());
    }

    let keys: HashSet<&str> = batch.records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys.len(), 6);
    assert_eq!(fixture.tables.item_count("GreenCheckPoint").await, 6);

    let snapshot = fixture.snapshots.read_rows("greenbatch.jsonl").await.unwrap();
    assert_eq!(snapshot.len(), 6);
    assert!(!snapshot[0].fields().contains_key(ID_ATTRIBUTE));
    assert_eq!(snapshot[0].fields()["ehail_fee"], json!("0"));
}

#[tokio::test]
async fn test_second_run_skips_sampled_rows() {
    let fixture = Fixture::new(source(10)).await;
    let sampler = fixture.sampler();

    let first = sampler.run_with_size(4).await.unwrap();
    let second = sampler.run_with_size(4).await.unwrap();

    let first_rows: Vec<_> = first.records.iter().map(|r| r.row.clone()).collect();
    for record in &second.records {
        assert!(!first_rows.contains(&record.row));
    }
    assert_eq!(fixture.tables.item_count("GreenCheckPoint").await, 8);
}

#[tokio::test]
async fn test_row_equal_after_normalization_is_excluded() {
    // The checkpoint holds the row as strings; the source holds numbers and null
    let fixture = Fixture::new(vec![trip(2, 7.5), trip(1, 9.0)]).await;
    let seen = trip(2, 7.5).normalize().into_checkpoint();
    fixture.checkpoint().append(&[seen]).await.unwrap();

    let batch = fixture.sampler().run_with_size(5).await.unwrap();

    assert!(!batch.checkpoint_was_empty);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.records[0].row, trip(1, 9.0).normalize());
}

#[tokio::test]
async fn test_checkpoint_only_row_is_selected_first() {
    let fixture = Fixture::new(vec![trip(1, 1.0), trip(1, 2.0)]).await;
    let retired = trip(2, 99.0).normalize().into_checkpoint();
    fixture.checkpoint().append(&[retired]).await.unwrap();

    let batch = fixture.sampler().run_with_size(2).await.unwrap();

    assert_eq!(batch.candidates, 3);
    assert_eq!(batch.records[0].row, trip(2, 99.0).normalize());
    assert_eq!(batch.records[1].row, trip(1, 1.0).normalize());
}

#[tokio::test]
async fn test_source_only_policy_ignores_checkpoint_only_rows() {
    let mut fixture = Fixture::new(vec![trip(1, 1.0), trip(1, 1.0), trip(1, 2.0)]).await;
    fixture.config.sampler.dedup_policy = DedupPolicy::SourceOnly;
    let retired = trip(2, 99.0).normalize().into_checkpoint();
    fixture.checkpoint().append(&[retired]).await.unwrap();

    let batch = fixture.sampler().run_with_size(10).await.unwrap();

    let rows: Vec<_> = batch.records.iter().map(|r| r.row.clone()).collect();
    assert_eq!(rows, vec![trip(1, 1.0).normalize(), trip(1, 2.0).normalize()]);
}

#[tokio::test]
async fn test_no_candidates_clears_snapshot() {
    let fixture = Fixture::new(source(3)).await;
    let sampler = fixture.sampler();
    sampler.run_with_size(3).await.unwrap();
    assert_eq!(fixture.snapshots.read_rows("greenbatch.jsonl").await.unwrap().len(), 3);

    let batch = sampler.run_with_size(3).await.unwrap();

    assert!(batch.is_empty());
    assert_eq!(batch.candidates, 0);
    assert_eq!(fixture.tables.item_count("GreenCheckPoint").await, 3);
    // The previous batch must not stay publishable
    assert!(fixture.snapshots.contains("greenbatch.jsonl").await);
    let snapshot = fixture.snapshots.read_rows("greenbatch.jsonl").await.unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let mut fixture = Fixture::new(source(5)).await;
    fixture.config.application.dry_run = true;

    let batch = fixture.sampler().run_with_size(3).await.unwrap();

    assert_eq!(batch.len(), 3);
    assert_eq!(fixture.tables.item_count("GreenCheckPoint").await, 0);
    assert!(!fixture.snapshots.contains("greenbatch.jsonl").await);
}

#[tokio::test]
async fn test_empty_source_fails() {
    let fixture = Fixture::new(Vec::new()).await;
    let err = fixture.sampler().run_with_size(3).await.unwrap_err();
    assert!(matches!(err, TripstreamError::EmptySource(_)));
    assert_eq!(fixture.tables.item_count("GreenCheckPoint").await, 0);
}

#[tokio::test]
async fn test_missing_source_is_upstream_read() {
    let fixture = Fixture::new(Vec::new()).await;
    let mut config = fixture.config.clone();
    config.pipeline.source_name = Some("absent.jsonl".to_string());
    let handles = StoreHandles {
        tables: fixture.tables.clone(),
        counters: fixture.tables.clone(),
    };
    let sampler = DeduplicatingSampler::from_config(&config, &handles, fixture.snapshots.clone());

    let err = sampler.run_with_size(1).await.unwrap_err();
    assert!(matches!(err, TripstreamError::UpstreamRead(_)));
}
