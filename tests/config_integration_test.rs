//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables hold `ENV_MUTEX` so they
//! don't interfere with each other.

use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tripstream::config::{
    load_config, AllocationStrategy, DedupPolicy, MalformedPolicy, StoreBackend,
};
use tripstream::domain::{TripCategory, TripstreamError};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("TRIPSTREAM_APPLICATION_LOG_LEVEL");
    std::env::remove_var("TRIPSTREAM_APPLICATION_DRY_RUN");
    std::env::remove_var("TRIPSTREAM_PIPELINE_CATEGORY");
    std::env::remove_var("TRIPSTREAM_SAMPLER_MAX_RECORDS");
    std::env::remove_var("TRIPSTREAM_WRITER_MAX_ATTEMPTS");
    std::env::remove_var("TRIPSTREAM_STORE_BACKEND");
    std::env::remove_var("TEST_TRIPSTREAM_BUCKET");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[pipeline]
category = "green"
object_dir = "/srv/bucket"
source_name = "green_2023.jsonl"
snapshot_name = "green_latest.jsonl"
checkpoint_table = "GreenSeen"
target_table = "GreenTrips"

[store]
backend = "file"
data_dir = "/srv/tables"
page_size = 250

[sampler]
min_records = 10
max_records = 20
dedup_policy = "source_only"

[consumer]
allocation = "counter"
counter_name = "green-ids"
malformed_policy = "skip"
cas_max_attempts = 8

[writer]
chunk_size = 20
max_attempts = 6
initial_delay_ms = 50
max_delay_ms = 2000
backoff_multiplier = 3.0

[stream]
partition_key = "2"
delivery_path = "/srv/delivery.json"

[logging]
local_enabled = false
local_path = "/var/log/tripstream"
local_rotation = "hourly"

[lookups.vendor]
entries = { "3" = "Curb" }
"#,
    );

    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    assert_eq!(config.pipeline.category, TripCategory::Green);
    assert_eq!(config.pipeline.source_name(), "green_2023.jsonl");
    assert_eq!(config.pipeline.snapshot_name(), "green_latest.jsonl");
    assert_eq!(config.pipeline.checkpoint_table(), "GreenSeen");
    assert_eq!(config.pipeline.target_table(), "GreenTrips");

    assert_eq!(config.store.backend, StoreBackend::File);
    assert_eq!(config.store.page_size, 250);

    assert_eq!(config.sampler.min_records, 10);
    assert_eq!(config.sampler.max_records, 20);
    assert_eq!(config.sampler.dedup_policy, DedupPolicy::SourceOnly);

    assert_eq!(config.consumer.allocation, AllocationStrategy::Counter);
    assert_eq!(config.consumer.counter_name.as_deref(), Some("green-ids"));
    assert_eq!(config.consumer.malformed_policy, MalformedPolicy::Skip);
    assert_eq!(config.consumer.cas_max_attempts, 8);

    assert_eq!(config.writer.chunk_size, 20);
    assert_eq!(config.writer.max_attempts, 6);
    assert_eq!(config.writer.backoff_multiplier, 3.0);

    assert_eq!(config.stream.partition_key, "2");
    assert!(!config.logging.local_enabled);
    assert_eq!(config.lookups["vendor"].entries["3"], "Curb");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[pipeline]\ncategory = \"hvfhv\"\n");
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.pipeline.source_name(), "hvfhv_final.jsonl");
    assert_eq!(config.pipeline.snapshot_name(), "hvfhvbatch.jsonl");
    assert_eq!(config.pipeline.checkpoint_table(), "HvfhvCheckPoint");
    assert_eq!(config.pipeline.target_table(), "HvfhvTable");
    assert_eq!(config.sampler.dedup_policy, DedupPolicy::SymmetricDifference);
    assert_eq!(config.consumer.allocation, AllocationStrategy::Scan);
    assert_eq!(config.consumer.malformed_policy, MalformedPolicy::Abort);
    assert_eq!(config.writer.chunk_size, 25);
    assert_eq!(config.stream.partition_key, "1");
    assert!(config.lookups.is_empty());
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_TRIPSTREAM_BUCKET", "/mnt/trips");

    let temp_file = write_config(
        r#"
[pipeline]
category = "fhv"
object_dir = "${TEST_TRIPSTREAM_BUCKET}"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();
    assert_eq!(config.pipeline.object_dir, "/mnt/trips");

    std::env::remove_var("TEST_TRIPSTREAM_BUCKET");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_TRIPSTREAM_BUCKET"));

    cleanup_env_vars();
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    std::env::set_var("TRIPSTREAM_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("TRIPSTREAM_APPLICATION_DRY_RUN", "true");
    std::env::set_var("TRIPSTREAM_PIPELINE_CATEGORY", "yellow");
    std::env::set_var("TRIPSTREAM_SAMPLER_MAX_RECORDS", "250");
    std::env::set_var("TRIPSTREAM_WRITER_MAX_ATTEMPTS", "9");
    std::env::set_var("TRIPSTREAM_STORE_BACKEND", "memory");

    let temp_file = write_config(
        r#"
[application]
log_level = "info"

[pipeline]
category = "fhv"

[store]
backend = "file"
"#,
    );
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert!(config.application.dry_run);
    assert_eq!(config.pipeline.category, TripCategory::Yellow);
    assert_eq!(config.pipeline.target_table(), "YellowTable");
    assert_eq!(config.sampler.max_records, 250);
    assert_eq!(config.writer.max_attempts, 9);
    assert_eq!(config.store.backend, StoreBackend::Memory);

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_value() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TRIPSTREAM_WRITER_MAX_ATTEMPTS", "lots");

    let temp_file = write_config("[pipeline]\ncategory = \"fhv\"\n");
    let err = load_config(temp_file.path()).unwrap_err();
    assert!(matches!(err, TripstreamError::Configuration(_)));

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        ("[pipeline]\ncategory = \"taxi\"\n", "taxi"),
        (
            "[pipeline]\ncategory = \"fhv\"\n[sampler]\nmin_records = 50\nmax_records = 10\n",
            "min_records",
        ),
        (
            "[pipeline]\ncategory = \"fhv\"\n[writer]\nmax_attempts = 0\n",
            "max_attempts",
        ),
        (
            "[pipeline]\ncategory = \"fhv\"\n[application]\nlog_level = \"loud\"\n",
            "log_level",
        ),
        (
            "[pipeline]\ncategory = \"fhv\"\n[lookups.vendor]\n",
            "cannot both be empty",
        ),
    ];

    for (contents, expected) in cases {
        let temp_file = write_config(contents);
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(matches!(err, TripstreamError::Configuration(_)));
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }
}
