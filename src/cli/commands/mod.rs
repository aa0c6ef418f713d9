//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod consume;
pub mod init;
pub mod publish;
pub mod sample;
pub mod status;
pub mod validate;

use crate::config::{load_config, TripstreamConfig};
use crate::domain::{Result, TripCategory, TripstreamError};

/// Load the configuration and apply command-line overrides
pub(crate) fn prepare_config(
    config_path: &str,
    category: Option<TripCategory>,
    dry_run: bool,
) -> Result<TripstreamConfig> {
    let mut config = load_config(config_path)?;

    if let Some(category) = category {
        tracing::info!(category = %category, "Overriding category from CLI");
        config.pipeline.category = category;
    }
    if dry_run {
        tracing::info!("Enabling dry-run mode from CLI");
        config.application.dry_run = true;
    }

    config.validate().map_err(|e| {
        TripstreamError::Configuration(format!("Configuration validation failed: {e}"))
    })?;
    Ok(config)
}
