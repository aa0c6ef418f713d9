//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the tripstream configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Category: {}", config.pipeline.category);
        println!("  Source: {}/{}", config.pipeline.object_dir, config.pipeline.source_name());
        println!("  Snapshot: {}", config.pipeline.snapshot_name());
        println!("  Checkpoint Table: {}", config.pipeline.checkpoint_table());
        println!("  Target Table: {}", config.pipeline.target_table());
        println!("  Store Backend: {:?}", config.store.backend);
        println!(
            "  Sample Size: {}..={}",
            config.sampler.min_records, config.sampler.max_records
        );
        println!("  Dedup Policy: {:?}", config.sampler.dedup_policy);
        println!("  Allocation: {:?}", config.consumer.allocation);
        println!("  Malformed Policy: {:?}", config.consumer.malformed_policy);
        println!(
            "  Writer: chunks of {}, {} attempts",
            config.writer.chunk_size, config.writer.max_attempts
        );
        if !config.lookups.is_empty() {
            let names: Vec<&str> = config.lookups.keys().map(String::as_str).collect();
            println!("  Lookup Overrides: {}", names.join(", "));
        }
        println!();
        Ok(0)
    }
}
