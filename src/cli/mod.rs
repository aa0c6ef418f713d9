//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for tripstream using clap.

pub mod commands;

use crate::domain::TripstreamError;
use clap::{Parser, Subcommand};

/// Tripstream - checkpointed trip sampling and stream ingestion
#[derive(Parser, Debug)]
#[command(name = "tripstream")]
#[command(version, about, long_about = None)]
#[command(author = "Tripstream Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tripstream.toml", env = "TRIPSTREAM_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TRIPSTREAM_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample never-seen rows into the snapshot and checkpoint
    Sample(commands::sample::SampleArgs),

    /// Put every snapshot row on the stream
    Publish(commands::publish::PublishArgs),

    /// Consume one delivery batch into the target table
    Consume(commands::consume::ConsumeArgs),

    /// Show checkpoint size, target watermark and counter
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Exit code for an error reaching the command boundary
///
/// 1 for a failed invocation, 2 for configuration errors, 4 for store
/// errors and 5 for anything else.
pub fn exit_code_for(error: &TripstreamError) -> i32 {
    match error {
        TripstreamError::Configuration(_) => 2,
        TripstreamError::Store(_) | TripstreamError::UpstreamRead(_) => 4,
        TripstreamError::EmptySource(_)
        | TripstreamError::MalformedRecord(_)
        | TripstreamError::WriteRetryExhaustion { .. }
        | TripstreamError::Allocation(_) => 1,
        TripstreamError::Serialization(_) | TripstreamError::Io(_) | TripstreamError::Other(_) => 5,
    }
}
