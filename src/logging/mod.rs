//! Logging and observability
//!
//! Events go to stderr, and optionally to rolling JSON files under
//! `logging.local_path`. `RUST_LOG` overrides the configured level.
//! The macros below give every stage the same run and retry fields.
//!
//! # Example
//!
//! ```no_run
//! use tripstream::logging::init_logging;
//! use tripstream::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(category = "fhv", "Sampler started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a pipeline run
///
/// # Example
///
/// ```no_run
/// use tripstream::log_run_start;
/// use tripstream::domain::TripCategory;
///
/// log_run_start!("sample", TripCategory::Fhv);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($operation:expr, $category:expr) => {
        tracing::info!(
            operation = $operation,
            category = %$category,
            "Starting run"
        );
    };
}

/// Log the completion of a pipeline run
///
/// # Example
///
/// ```no_run
/// use tripstream::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!("consume", 42, Duration::from_millis(850));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($operation:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Run completed"
        );
    };
}

/// Log a pipeline error with its kind and a context message
///
/// # Example
///
/// ```no_run
/// use tripstream::log_error_with_context;
/// use tripstream::domain::TripstreamError;
///
/// let error = TripstreamError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            kind = $error.kind(),
            error = %$error,
            context = $context,
            "Pipeline error"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use tripstream::log_retry_attempt;
///
/// log_retry_attempt!(2, 5, "2 item(s) unprocessed");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
