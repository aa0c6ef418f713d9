//! Configuration schema types
//!
//! This module defines the configuration structure for tripstream.

use crate::domain::TripCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names of the lookup tables a config file may override
pub const LOOKUP_TABLE_NAMES: [&str; 7] = [
    "vendor",
    "rate_code",
    "payment",
    "platform",
    "trip_type",
    "shared_ride",
    "shared_match",
];

/// Largest chunk the store accepts in one batch write
pub const MAX_CHUNK_SIZE: usize = 25;

/// Key-value store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local tables, lost on exit
    Memory,
    /// JSON files under `store.data_dir`
    #[default]
    File,
}

/// How the sampler computes never-seen rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Rows appearing exactly once across checkpoint and source, checkpoint rows first
    #[default]
    SymmetricDifference,
    /// Source rows that are not in the checkpoint
    SourceOnly,
}

/// How the consumer allocates sequential IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    /// Scan the target table for its maximum ID on every invocation
    #[default]
    Scan,
    /// Compare-and-swap an explicit counter
    Counter,
}

/// What the consumer does with an event that fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole invocation
    #[default]
    Abort,
    /// Log and drop the event
    Skip,
}

/// Main tripstream configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripstreamConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Category and artifact names
    pub pipeline: PipelineConfig,

    /// Key-value store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Sampler settings
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Stream consumer settings
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Batched writer settings
    #[serde(default)]
    pub writer: WriterConfig,

    /// Stream transport settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lookup table overrides by table name
    #[serde(default)]
    pub lookups: BTreeMap<String, LookupTableConfig>,
}

impl TripstreamConfig {
    /// Configuration with every default for a category
    pub fn for_category(category: TripCategory) -> Self {
        Self {
            application: ApplicationConfig::default(),
            pipeline: PipelineConfig::for_category(category),
            store: StoreConfig::default(),
            sampler: SamplerConfig::default(),
            consumer: ConsumerConfig::default(),
            writer: WriterConfig::default(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
            lookups: BTreeMap::new(),
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.pipeline.validate()?;
        self.store.validate()?;
        self.sampler.validate()?;
        self.consumer.validate()?;
        self.writer.validate()?;
        self.stream.validate()?;
        self.logging.validate()?;

        for (name, table) in &self.lookups {
            if !LOOKUP_TABLE_NAMES.contains(&name.as_str()) {
                return Err(format!(
                    "Unknown lookup table '{name}'. Must be one of: {}",
                    LOOKUP_TABLE_NAMES.join(", ")
                ));
            }
            table
                .validate()
                .map_err(|e| format!("lookups.{name}: {e}"))?;
        }
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (don't write snapshots, checkpoints or target items)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Category and artifact naming
///
/// Every name is optional and derives from the category when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Trip category this pipeline handles
    pub category: TripCategory,

    /// Directory standing in for the object storage bucket
    #[serde(default = "default_object_dir")]
    pub object_dir: String,

    /// Bulk source dataset name
    #[serde(default)]
    pub source_name: Option<String>,

    /// Sampled snapshot artifact name
    #[serde(default)]
    pub snapshot_name: Option<String>,

    /// Checkpoint table name
    #[serde(default)]
    pub checkpoint_table: Option<String>,

    /// Target table name
    #[serde(default)]
    pub target_table: Option<String>,
}

impl PipelineConfig {
    /// Pipeline settings with every name derived from the category
    pub fn for_category(category: TripCategory) -> Self {
        Self {
            category,
            object_dir: default_object_dir(),
            source_name: None,
            snapshot_name: None,
            checkpoint_table: None,
            target_table: None,
        }
    }

    /// Resolved source dataset name
    pub fn source_name(&self) -> String {
        self.source_name
            .clone()
            .unwrap_or_else(|| self.category.default_source_name())
    }

    /// Resolved snapshot artifact name
    pub fn snapshot_name(&self) -> String {
        self.snapshot_name
            .clone()
            .unwrap_or_else(|| self.category.default_snapshot_name())
    }

    /// Resolved checkpoint table name
    pub fn checkpoint_table(&self) -> String {
        self.checkpoint_table
            .clone()
            .unwrap_or_else(|| self.category.default_checkpoint_table())
    }

    /// Resolved target table name
    pub fn target_table(&self) -> String {
        self.target_table
            .clone()
            .unwrap_or_else(|| self.category.default_target_table())
    }

    fn validate(&self) -> Result<(), String> {
        if self.object_dir.trim().is_empty() {
            return Err("pipeline.object_dir cannot be empty".to_string());
        }

        let names = [
            ("source_name", &self.source_name),
            ("snapshot_name", &self.snapshot_name),
            ("checkpoint_table", &self.checkpoint_table),
            ("target_table", &self.target_table),
        ];
        for (field, value) in names {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("pipeline.{field} cannot be empty"));
            }
        }

        if self.checkpoint_table() == self.target_table() {
            return Err("pipeline.checkpoint_table and pipeline.target_table must differ".to_string());
        }
        if self.source_name() == self.snapshot_name() {
            return Err("pipeline.source_name and pipeline.snapshot_name must differ".to_string());
        }
        Ok(())
    }
}

/// Key-value store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend (memory or file)
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory holding table files for the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Items requested per scan page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::File && self.data_dir.trim().is_empty() {
            return Err("store.data_dir cannot be empty for the file backend".to_string());
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err(format!(
                "store.page_size must be between 1 and 1000, got {}",
                self.page_size
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            data_dir: default_data_dir(),
            page_size: default_page_size(),
        }
    }
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Lower bound of the sample size (inclusive)
    #[serde(default = "default_min_records")]
    pub min_records: usize,

    /// Upper bound of the sample size (inclusive)
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Dedup semantics
    #[serde(default)]
    pub dedup_policy: DedupPolicy,
}

impl SamplerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.min_records == 0 {
            return Err("sampler.min_records must be >= 1".to_string());
        }
        if self.min_records > self.max_records {
            return Err(format!(
                "sampler.min_records ({}) must be <= sampler.max_records ({})",
                self.min_records, self.max_records
            ));
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_records: default_min_records(),
            max_records: default_max_records(),
            dedup_policy: DedupPolicy::default(),
        }
    }
}

/// Stream consumer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// ID allocation strategy (scan or counter)
    #[serde(default)]
    pub allocation: AllocationStrategy,

    /// Counter name for the counter strategy, defaults to the target table name
    #[serde(default)]
    pub counter_name: Option<String>,

    /// Handling of malformed events (abort or skip)
    #[serde(default)]
    pub malformed_policy: MalformedPolicy,

    /// Compare-and-swap attempts before the counter allocator gives up
    #[serde(default = "default_cas_max_attempts")]
    pub cas_max_attempts: usize,
}

impl ConsumerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.cas_max_attempts == 0 {
            return Err("consumer.cas_max_attempts must be >= 1".to_string());
        }
        if matches!(&self.counter_name, Some(name) if name.trim().is_empty()) {
            return Err("consumer.counter_name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            allocation: AllocationStrategy::default(),
            counter_name: None,
            malformed_policy: MalformedPolicy::default(),
            cas_max_attempts: default_cas_max_attempts(),
        }
    }
}

/// Batched writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Items per batch write (1-25)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Submissions per chunk before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl WriterConfig {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(format!(
                "writer.chunk_size must be between 1 and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            ));
        }
        if self.max_attempts == 0 {
            return Err("writer.max_attempts must be >= 1".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("writer.initial_delay_ms must be <= writer.max_delay_ms".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("writer.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Stream transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Partition key attached to every published message
    #[serde(default = "default_partition_key")]
    pub partition_key: String,

    /// File the publisher writes its delivery batch to
    #[serde(default = "default_delivery_path")]
    pub delivery_path: String,
}

impl StreamConfig {
    fn validate(&self) -> Result<(), String> {
        if self.partition_key.is_empty() {
            return Err("stream.partition_key cannot be empty".to_string());
        }
        if self.delivery_path.trim().is_empty() {
            return Err("stream.delivery_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            partition_key: default_partition_key(),
            delivery_path: default_delivery_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

/// Overrides for one lookup table
///
/// Entries are merged over the built-in ones; a fallback replaces the
/// built-in fallback.
///
/// ```toml
/// [lookups.payment]
/// entries = { "1" = "Card", "2" = "Cash" }
/// fallback = "Undefined"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LookupTableConfig {
    /// Code to label
    #[serde(default)]
    pub entries: BTreeMap<String, String>,

    /// Label for codes not in `entries`; unmatched codes fail without one
    #[serde(default)]
    pub fallback: Option<String>,
}

impl LookupTableConfig {
    fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() && self.fallback.is_none() {
            return Err("entries and fallback cannot both be empty".to_string());
        }
        if self.entries.keys().any(|code| code.trim().is_empty()) {
            return Err("codes cannot be empty".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_object_dir() -> String {
    "./data/objects".to_string()
}

fn default_data_dir() -> String {
    "./data/tables".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_min_records() -> usize {
    1
}

fn default_max_records() -> usize {
    100
}

fn default_cas_max_attempts() -> usize {
    5
}

fn default_chunk_size() -> usize {
    MAX_CHUNK_SIZE
}

fn default_max_attempts() -> usize {
    5
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_partition_key() -> String {
    "1".to_string()
}

fn default_delivery_path() -> String {
    "./data/stream/delivery.json".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
