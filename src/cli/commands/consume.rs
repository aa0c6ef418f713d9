//! Consume command implementation

use super::prepare_config;
use crate::adapters::store::create_store;
use crate::adapters::stream::DeliveryBatch;
use crate::core::ingest::{InvocationResponse, StreamConsumer};
use crate::domain::TripCategory;
use clap::Args;

/// Arguments for the consume command
#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Delivery batch JSON file, instead of `stream.delivery_path`
    #[arg(short, long)]
    pub event: Option<String>,

    /// Override the configured trip category
    #[arg(long)]
    pub category: Option<TripCategory>,

    /// Transform and allocate without writing items
    #[arg(long)]
    pub dry_run: bool,
}

impl ConsumeArgs {
    /// Execute the consume command
    ///
    /// Prints the invocation response as JSON. Exits 0 on status 200 and 1
    /// otherwise.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting consume command");

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

        let consumer = match StreamConsumer::from_config(&config, &handles) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let path = self
            .event
            .clone()
            .unwrap_or_else(|| config.stream.delivery_path.clone());

        let response = match DeliveryBatch::read_from(&path).await {
            Ok(batch) => consumer.handle(&batch).await,
            Err(e) => {
                tracing::error!(error = %e, path = %path, "Failed to read delivery batch");
                InvocationResponse::error(e.to_string())
            }
        };

        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(if response.is_success() { 0 } else { 1 })
    }
}
