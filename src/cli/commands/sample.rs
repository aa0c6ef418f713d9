//! Sample command implementation

use super::prepare_config;
use crate::adapters::snapshot::LocalSnapshotStore;
use crate::adapters::store::create_store;
use crate::cli::exit_code_for;
use crate::core::sampler::DeduplicatingSampler;
use crate::domain::TripCategory;
use clap::Args;
use std::sync::Arc;

/// Arguments for the sample command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Override the configured trip category
    #[arg(long)]
    pub category: Option<TripCategory>,

    /// Use a fixed sample size instead of drawing one
    #[arg(long)]
    pub size: Option<usize>,

    /// Select rows without writing the snapshot or checkpoint
    #[arg(long)]
    pub dry_run: bool,
}

impl SampleArgs {
    /// Execute the sample command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting sample command");

        let config = match prepare_config(config_path, self.category, self.dry_run) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let handles = match create_store(&config).await {
            Ok(h) => h,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open store");
                eprintln!("❌ Failed to open store: {e}");
                return Ok(4);
            }
        };

        let snapshots = Arc::new(LocalSnapshotStore::new(&config.pipeline.object_dir));
        let sampler = DeduplicatingSampler::from_config(&config, &handles, snapshots);

        let result = match self.size {
            Some(size) => sampler.run_with_size(size).await,
            None => sampler.run().await,
        };

        match result {
            Ok(batch) => {
                println!("📊 Sample Summary:");
                println!("  Category: {}", config.pipeline.category);
                println!("  Requested: {}", batch.requested);
                println!("  Candidates: {}", batch.candidates);
                println!("  Selected: {}", batch.len());
                if config.application.dry_run {
                    println!("  (dry run, nothing written)");
                } else if !batch.is_empty() {
                    println!("  Snapshot: {}", config.pipeline.snapshot_name());
                    println!("  Checkpoint: {}", config.pipeline.checkpoint_table());
                }
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Sample failed");
                eprintln!("❌ Sample failed: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = SampleArgs {
            category: None,
            size: Some(1),
            dry_run: true,
        };
        assert_eq!(args.execute("does-not-exist.toml").await.unwrap(), 2);
    }
}
