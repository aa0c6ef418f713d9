//! Integration tests for the stream consumer

use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tripstream::adapters::store::{CounterStore, MemoryTableStore, StoreHandles};
use tripstream::adapters::stream::{DeliveryBatch, DeliveryRecord, StreamPayload};
use tripstream::config::{AllocationStrategy, MalformedPolicy, TripstreamConfig};
use tripstream::core::ingest::StreamConsumer;
use tripstream::domain::{AttributeValue, TripCategory, TripstreamError, ID_ATTRIBUTE};

async fn store() -> Arc<MemoryTableStore> {
    Arc::new(MemoryTableStore::with_tables(&["FhvCheckPoint", "FhvTable"]).await)
}

fn handles(store: &Arc<MemoryTableStore>) -> StoreHandles {
    StoreHandles {
        tables: store.clone(),
        counters: store.clone(),
    }
}

fn config(policy: MalformedPolicy) -> TripstreamConfig {
    let mut config = TripstreamConfig::for_category(TripCategory::Fhv);
    config.consumer.malformed_policy = policy;
    config
}

fn fhv_trip(minute: u32, sr_flag: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "dispatching_base_num": "B00013",
        "pickup_datetime": format!("2023-01-01 00:{minute:02}:00"),
        "dropOff_datetime": format!("2023-01-01 00:{:02}:30", minute + 10),
        "PUlocationID": null,
        "DOlocationID": null,
        "SR_Flag": sr_flag,
        "Affiliated_base_number": "B00013"
    }))
    .unwrap()
}

fn batch(messages: Vec<Vec<u8>>) -> DeliveryBatch {
    DeliveryBatch::from_messages("1", &messages)
}

fn stored_ids(items: &[tripstream::domain::Item]) -> BTreeSet<u64> {
    items
        .iter()
        .map(|item| item[ID_ATTRIBUTE].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_writes_every_event_with_fresh_ids() {
    let store = store().await;
    store.seed_ids("FhvTable", &[1, 2, 3]).await.unwrap();
    let consumer = StreamConsumer::from_config(&config(MalformedPolicy::Abort), &handles(&store))
        .unwrap();

    let response = consumer
        .handle(&batch(vec![fhv_trip(0, json!(0)), fhv_trip(5, json!(1))]))
        .await;

    assert!(response.is_success(), "{}", response.body);
    assert_eq!(
        response.body,
        "Data successfully written to FhvTable: 2 record(s), IDs 4-5."
    );

    let items = store.items("FhvTable").await;
    assert_eq!(stored_ids(&items), (1..=5).collect());

    let written = items
        .iter()
        .find(|item| item[ID_ATTRIBUTE].as_u64() == Some(5))
        .unwrap();
    assert_eq!(written["SR_Flag"], AttributeValue::s("Shared"));
    assert_eq!(written["Trip_Duration"], AttributeValue::n("10.5"));
}

#[tokio::test]
async fn test_abort_policy_writes_nothing() {
    let store = store().await;
    let consumer = StreamConsumer::from_config(&config(MalformedPolicy::Abort), &handles(&store))
        .unwrap();

    let input = batch(vec![
        fhv_trip(0, json!(0)),
        fhv_trip(1, json!(7)),
        fhv_trip(2, json!(1)),
    ]);
    let response = consumer.handle(&input).await;
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("SR_Flag"));
    assert_eq!(store.item_count("FhvTable").await, 0);

    let err = consumer.process(&input).await.unwrap_err();
    assert!(matches!(err, TripstreamError::MalformedRecord(_)));
}

#[tokio::test]
async fn test_skip_policy_keeps_ids_gap_free() {
    let store = store().await;
    let consumer =
        StreamConsumer::from_config(&config(MalformedPolicy::Skip), &handles(&store)).unwrap();

    let summary = consumer
        .process(&batch(vec![
            fhv_trip(0, json!(0)),
            fhv_trip(1, json!(7)),
            b"not json".to_vec(),
            fhv_trip(2, json!(1)),
        ]))
        .await
        .unwrap();

    assert_eq!(summary.received, 4);
    assert_eq!(summary.transformed, 2);
    assert_eq!(
        summary.skipped.iter().map(|s| s.sequence).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(summary.id_range, Some((1, 2)));
    assert_eq!(stored_ids(&store.items("FhvTable").await), BTreeSet::from([1, 2]));
}

#[tokio::test]
async fn test_invalid_base64_is_malformed() {
    let store = store().await;
    let consumer = StreamConsumer::from_config(&config(MalformedPolicy::Abort), &handles(&store))
        .unwrap();

    let input = DeliveryBatch {
        records: vec![DeliveryRecord {
            kinesis: StreamPayload {
                partition_key: Some("1".to_string()),
                sequence_number: None,
                data: "%%% not base64 %%%".to_string(),
            },
        }],
    };

    let err = consumer.process(&input).await.unwrap_err();
    assert!(matches!(err, TripstreamError::MalformedRecord(_)));
    assert_eq!(store.item_count("FhvTable").await, 0);
}

#[tokio::test]
async fn test_counter_strategy_advances_counter() {
    let store = store().await;
    store.seed_ids("FhvTable", &[10]).await.unwrap();
    let mut config = config(MalformedPolicy::Abort);
    config.consumer.allocation = AllocationStrategy::Counter;
    let consumer = StreamConsumer::from_config(&config, &handles(&store)).unwrap();

    let first = consumer
        .process(&batch(vec![fhv_trip(0, json!(0)), fhv_trip(1, json!(0))]))
        .await
        .unwrap();
    let second = consumer
        .process(&batch(vec![fhv_trip(2, json!(0))]))
        .await
        .unwrap();

    assert_eq!(first.id_range, Some((11, 12)));
    assert_eq!(second.id_range, Some((13, 13)));
    assert_eq!(store.read_counter("FhvTable").await.unwrap(), Some(13));
    assert_eq!(store.item_count("FhvTable").await, 4);
}

#[tokio::test]
async fn test_dry_run_allocates_but_does_not_write() {
    let store = store().await;
    let mut config = config(MalformedPolicy::Abort);
    config.application.dry_run = true;
    let consumer = StreamConsumer::from_config(&config, &handles(&store)).unwrap();

    let summary = consumer
        .process(&batch(vec![fhv_trip(0, json!(0))]))
        .await
        .unwrap();

    assert_eq!(summary.id_range, Some((1, 1)));
    assert_eq!(summary.write.submissions, 0);
    assert_eq!(store.item_count("FhvTable").await, 0);
}
