//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::TripstreamConfig;
use crate::domain::errors::TripstreamError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TripstreamConfig
/// 4. Applies environment variable overrides (TRIPSTREAM_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `TripstreamError::Configuration` if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use tripstream::config::loader::load_config;
///
/// let config = load_config("tripstream.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TripstreamConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TripstreamError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TripstreamError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Performs the same substitution, override and validation steps as
/// [`load_config`].
pub fn parse_config(contents: &str) -> Result<TripstreamConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: TripstreamConfig = toml::from_str(&contents)
        .map_err(|e| TripstreamError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        TripstreamError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| TripstreamError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // Comment lines may mention variables that are never set
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(TripstreamError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        TripstreamError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using TRIPSTREAM_* prefix
///
/// Environment variables follow the pattern: TRIPSTREAM_<SECTION>_<KEY>
/// For example: TRIPSTREAM_PIPELINE_CATEGORY, TRIPSTREAM_WRITER_MAX_ATTEMPTS
fn apply_env_overrides(config: &mut TripstreamConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Pipeline overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_PIPELINE_CATEGORY") {
        config.pipeline.category = val.parse().map_err(TripstreamError::Configuration)?;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_PIPELINE_OBJECT_DIR") {
        config.pipeline.object_dir = val;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_PIPELINE_CHECKPOINT_TABLE") {
        config.pipeline.checkpoint_table = Some(val);
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_PIPELINE_TARGET_TABLE") {
        config.pipeline.target_table = Some(val);
    }

    // Store overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_STORE_BACKEND") {
        config.store.backend = match val.to_lowercase().as_str() {
            "memory" => super::schema::StoreBackend::Memory,
            "file" => super::schema::StoreBackend::File,
            other => {
                return Err(TripstreamError::Configuration(format!(
                    "Invalid TRIPSTREAM_STORE_BACKEND '{other}'. Must be one of: memory, file"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_STORE_DATA_DIR") {
        config.store.data_dir = val;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_STORE_PAGE_SIZE") {
        config.store.page_size = parse_override("TRIPSTREAM_STORE_PAGE_SIZE", &val)?;
    }

    // Sampler overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_SAMPLER_MIN_RECORDS") {
        config.sampler.min_records = parse_override("TRIPSTREAM_SAMPLER_MIN_RECORDS", &val)?;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_SAMPLER_MAX_RECORDS") {
        config.sampler.max_records = parse_override("TRIPSTREAM_SAMPLER_MAX_RECORDS", &val)?;
    }

    // Consumer overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_CONSUMER_CAS_MAX_ATTEMPTS") {
        config.consumer.cas_max_attempts =
            parse_override("TRIPSTREAM_CONSUMER_CAS_MAX_ATTEMPTS", &val)?;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_CONSUMER_COUNTER_NAME") {
        config.consumer.counter_name = Some(val);
    }

    // Writer overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_WRITER_CHUNK_SIZE") {
        config.writer.chunk_size = parse_override("TRIPSTREAM_WRITER_CHUNK_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_WRITER_MAX_ATTEMPTS") {
        config.writer.max_attempts = parse_override("TRIPSTREAM_WRITER_MAX_ATTEMPTS", &val)?;
    }

    // Stream overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_STREAM_PARTITION_KEY") {
        config.stream.partition_key = val;
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_STREAM_DELIVERY_PATH") {
        config.stream.delivery_path = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("TRIPSTREAM_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("TRIPSTREAM_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
