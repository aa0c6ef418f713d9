// Tripstream - Checkpointed trip sampling and stream ingestion
// Copyright (c) 2025 Tripstream Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use tripstream::cli::{Cli, Commands};
use tripstream::config::{load_config, LoggingConfig};
use tripstream::logging::init_logging;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; commands
    // report config errors themselves
    let loaded = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = loaded.map(|c| c.logging).unwrap_or_else(|| LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    });

    let _guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Tripstream - checkpointed trip sampling and stream ingestion"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    drop(_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Sample(args) => args.execute(&cli.config).await,
        Commands::Publish(args) => args.execute(&cli.config).await,
        Commands::Consume(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
