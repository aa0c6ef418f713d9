//! Status command implementation
//!
//! Shows the checkpoint size, the target table's ID watermark and the
//! allocation counter for the configured category.

use super::prepare_config;
use crate::adapters::store::create_store;
use crate::cli::exit_code_for;
use crate::core::checkpoint::CheckpointStore;
use crate::core::ingest::{BatchWriter, WriterSettings};
use crate::core::state::ScanAllocator;
use crate::domain::TripCategory;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Override the configured trip category
    #[arg(long)]
    pub category: Option<TripCategory>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking pipeline status");

        println!("📊 Pipeline Status");
        println!();

        let config = match prepare_config(config_path, self.category, false) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let handles = match create_store(&config).await {
            Ok(h) => h,
            Err(e) => {
                println!("❌ Failed to open store");
                println!("   Error: {e}");
                return Ok(4);
            }
        };

        let checkpoint_table = config.pipeline.checkpoint_table();
        let target_table = config.pipeline.target_table();
        let counter_name = config
            .consumer
            .counter_name
            .clone()
            .unwrap_or_else(|| target_table.clone());

        let checkpoint = CheckpointStore::new(
            handles.tables.clone(),
            checkpoint_table.clone(),
            config.store.page_size,
            BatchWriter::new(handles.tables.clone(), WriterSettings::default()),
        );
        let scan = ScanAllocator::new(handles.tables.clone(), target_table.clone(), config.store.page_size);

        let checkpoint_rows = match checkpoint.count().await {
            Ok(n) => n,
            Err(e) => return Ok(report_failure("checkpoint", &e)),
        };
        let watermark = match scan.watermark().await {
            Ok(w) => w,
            Err(e) => return Ok(report_failure("target table", &e)),
        };
        let counter = match handles.counters.read_counter(&counter_name).await {
            Ok(c) => c,
            Err(e) => return Ok(report_failure("counter", &e)),
        };

        println!("{:<22} {}", "Category", config.pipeline.category);
        println!("{:<22} {} ({} rows)", "Checkpoint table", checkpoint_table, checkpoint_rows);
        println!("{:<22} {} (max ID {})", "Target table", target_table, watermark.max_id);
        println!(
            "{:<22} {} ({})",
            "Allocation counter",
            counter_name,
            counter.map_or_else(|| "not initialised".to_string(), |value| value.to_string())
        );
        println!();
        Ok(0)
    }
}

fn report_failure(what: &str, error: &crate::domain::TripstreamError) -> i32 {
    println!("❌ Failed to read {what}");
    println!("   Error: {error}");
    exit_code_for(error)
}
