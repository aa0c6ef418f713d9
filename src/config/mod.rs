//! Configuration management for tripstream.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! tripstream uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TRIPSTREAM_<SECTION>_<KEY>` environment overrides
//! - Default values for every optional setting
//! - Per-section validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tripstream::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tripstream.toml")?;
//!
//! println!("Category: {}", config.pipeline.category);
//! println!("Target table: {}", config.pipeline.target_table());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run mode
//! - [`PipelineConfig`] - Category, source/snapshot names and table names
//! - [`StoreConfig`] - Key-value store backend and scan page size
//! - [`SamplerConfig`] - Sample size bounds and dedup policy
//! - [`ConsumerConfig`] - ID allocation and malformed-event handling
//! - [`WriterConfig`] - Chunk size and retry backoff
//! - [`StreamConfig`] - Partition key and delivery file
//! - [`LoggingConfig`] - Logging configuration
//! - [`LookupTableConfig`] - Lookup table overrides
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [pipeline]
//! category = "yellow"
//! object_dir = "${TRIPSTREAM_BUCKET_DIR}"
//!
//! [sampler]
//! min_records = 1
//! max_records = 100
//!
//! [consumer]
//! allocation = "counter"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    AllocationStrategy, ApplicationConfig, ConsumerConfig, DedupPolicy, LoggingConfig,
    LookupTableConfig, MalformedPolicy, PipelineConfig, SamplerConfig, StoreBackend, StoreConfig,
    StreamConfig, TripstreamConfig, WriterConfig,
};
