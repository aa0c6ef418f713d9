//! Init command implementation
//!
//! This module implements the `init` command for generating a starter
//! configuration file.

use crate::domain::TripCategory;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tripstream.toml")]
    pub output: String,

    /// Trip category the pipeline handles
    #[arg(long, default_value = "yellow")]
    pub category: TripCategory,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, category = %self.category, "Initializing configuration file");

        println!("📝 Initializing tripstream configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples(self.category)
        } else {
            Self::generate_minimal_config(self.category)
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!(
                    "  1. Put {} under pipeline.object_dir",
                    self.category.default_source_name()
                );
                println!("  2. Validate configuration: tripstream validate-config");
                println!("  3. Sample: tripstream sample");
                println!("  4. Publish: tripstream publish");
                println!("  5. Consume: tripstream consume");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config(category: TripCategory) -> String {
        format!(
            r#"# Tripstream Configuration File

[application]
log_level = "info"
dry_run = false

[pipeline]
category = "{category}"
object_dir = "./data/objects"

[store]
backend = "file"
data_dir = "./data/tables"

[sampler]
min_records = 1
max_records = 100

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        )
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples(category: TripCategory) -> String {
        format!(
            r#"# Tripstream Configuration File
#
# Values may reference environment variables as ${{VAR_NAME}}, and any key
# can be overridden with TRIPSTREAM_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Dry run mode (no snapshot, checkpoint, stream or table writes)
dry_run = false

# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
# Trip category: fhv, green, hvfhv or yellow
category = "{category}"

# Directory holding the bulk source dataset and snapshot artifacts
object_dir = "./data/objects"

# Names default from the category
source_name = "{source}"
snapshot_name = "{snapshot}"
checkpoint_table = "{checkpoint}"
target_table = "{target}"

# ============================================================================
# Key-Value Store
# ============================================================================
[store]
# memory (lost on exit) or file
backend = "file"
data_dir = "./data/tables"

# Items per scan page (1-1000)
page_size = 100

# ============================================================================
# Sampler
# ============================================================================
[sampler]
# Sample size is drawn uniformly from [min_records, max_records]
min_records = 1
max_records = 100

# symmetric_difference: rows seen exactly once across checkpoint and source
# source_only: source rows not yet in the checkpoint
dedup_policy = "symmetric_difference"

# ============================================================================
# Stream Consumer
# ============================================================================
[consumer]
# scan: max ID from a full target scan (single writer only)
# counter: compare-and-swap counter, safe for concurrent consumers
allocation = "scan"
# counter_name = "{target}"

# abort: fail the invocation on a malformed event
# skip: drop malformed events and continue
malformed_policy = "abort"

# Compare-and-swap attempts for the counter allocator
cas_max_attempts = 5

# ============================================================================
# Batched Writer
# ============================================================================
[writer]
# Items per batch write (1-25)
chunk_size = 25

# Submissions per chunk before giving up
max_attempts = 5

# Backoff between resubmissions of unprocessed items
initial_delay_ms = 100
max_delay_ms = 5000
backoff_multiplier = 2.0

# ============================================================================
# Stream
# ============================================================================
[stream]
partition_key = "1"
delivery_path = "./data/stream/delivery.json"

# ============================================================================
# Logging
# ============================================================================
[logging]
local_enabled = true
local_path = "./logs"

# daily, hourly or never
local_rotation = "daily"

# ============================================================================
# Lookup Table Overrides
# ============================================================================
# Tables: vendor, rate_code, payment, platform, trip_type, shared_ride,
# shared_match. Entries merge over the built-in ones.
#
# [lookups.payment]
# entries = {{ "1" = "Credit card", "2" = "Cash" }}
# fallback = "Undefined"
"#,
            source = category.default_source_name(),
            snapshot = category.default_snapshot_name(),
            checkpoint = category.default_checkpoint_table(),
            target = category.default_target_table(),
        )
    }
}
