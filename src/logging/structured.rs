//! Subscriber setup
//!
//! Human-readable events go to stderr so command summaries and consumer
//! responses on stdout stay machine-readable. When `logging.local_enabled`
//! is set, a JSON copy of every event is appended to a rolling file.

use crate::config::LoggingConfig;
use crate::domain::{Result, TripstreamError};
use std::str::FromStr;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "tripstream.log";

/// Keeps the file writer's worker alive; drop it last to flush pending lines
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `log_level` when set. Other crates log
/// at `warn` unless `RUST_LOG` says otherwise.
///
/// # Errors
///
/// Returns `Configuration` for an unknown level, an uncreatable log
/// directory, or when a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use tripstream::config::LoggingConfig;
/// use tripstream::logging::init_logging;
///
/// let _guard = init_logging("info", &LoggingConfig::default()).expect("logging");
/// ```
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level)?;
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,tripstream={level}")))
    };

    let mut layers = vec![console_layer().with_filter(filter()).boxed()];

    let file_guard = if config.local_enabled {
        let (layer, guard) = file_layer(config)?;
        layers.push(layer.with_filter(filter()).boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| TripstreamError::Configuration(format!("Failed to install log subscriber: {e}")))?;

    tracing::debug!(
        level = %level,
        file_logging = config.local_enabled,
        path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn console_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
}

fn file_layer<S>(config: &LoggingConfig) -> Result<(impl Layer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        TripstreamError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        parse_rotation(&config.local_rotation),
        &config.local_path,
        LOG_FILE_PREFIX,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer);

    Ok((layer, guard))
}

/// Rotation names are checked by config validation; anything else is daily
fn parse_rotation(rotation: &str) -> Rotation {
    match rotation {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| {
        TripstreamError::Configuration(format!(
            "Invalid log level: {level}. Must be one of: trace, debug, info, warn, error"
        ))
    })
}
