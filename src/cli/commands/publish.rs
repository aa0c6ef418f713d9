//! Publish command implementation

use super::prepare_config;
use crate::adapters::snapshot::LocalSnapshotStore;
use crate::adapters::stream::FileStreamSink;
use crate::cli::exit_code_for;
use crate::core::publish::SnapshotPublisher;
use crate::domain::TripCategory;
use clap::Args;
use std::sync::Arc;

/// Arguments for the publish command
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Override the configured trip category
    #[arg(long)]
    pub category: Option<TripCategory>,

    /// Delivery batch file to write, instead of `stream.delivery_path`
    #[arg(short, long)]
    pub output: Option<String>,

    /// Read the snapshot without putting any message
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    /// Execute the publish command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting publish command");

        let config = match prepare_config(config_path, self.category, self.dry_run) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.stream.delivery_path.clone());
        let sink = Arc::new(FileStreamSink::new(&output));
        let snapshots = Arc::new(LocalSnapshotStore::new(&config.pipeline.object_dir));
        let publisher = SnapshotPublisher::from_config(&config, snapshots, sink);

        match publisher.publish().await {
            Ok(count) => {
                println!("✅ Published {count} message(s)");
                if !config.application.dry_run {
                    println!("  Delivery batch: {output}");
                }
                Ok(0)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Publish failed");
                eprintln!("❌ Publish failed: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }
}
