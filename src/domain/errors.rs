//! Domain error types
//!
//! This module defines the error hierarchy for tripstream.
//! All errors are domain-specific and don't expose third-party types.

use crate::domain::record::Item;
use thiserror::Error;

/// Main tripstream error type
///
/// This is the primary error type used throughout the application.
/// Every failure that reaches an invocation boundary is one of these.
#[derive(Debug, Error)]
pub enum TripstreamError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source dataset or checkpoint could not be fully retrieved or parsed
    #[error("Upstream read error: {0}")]
    UpstreamRead(String),

    /// Source dataset had no rows
    #[error("No records found: {0}")]
    EmptySource(String),

    /// A stream event failed to decode or transform
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Chunk retries ran out with items still unprocessed
    #[error("Write retries exhausted after {attempts} attempts: {} item(s) unwritten", unwritten.len())]
    WriteRetryExhaustion {
        /// Submissions made for the failing chunk
        attempts: usize,
        /// Items never confirmed written
        unwritten: Vec<Item>,
    },

    /// Identifier allocation failed
    #[error("ID allocation error: {0}")]
    Allocation(String),

    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Key-value store errors
///
/// Errors raised by store adapters. These errors don't expose the
/// backing implementation's types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Request was throttled
    #[error("Request throttled: {0}")]
    Throttled(String),

    /// Scan failed
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    /// Batch write failed as a whole
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Item is missing its key or carries a malformed attribute
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Batch exceeds the per-call item limit
    #[error("Batch too large: {size} items (limit {limit})")]
    BatchTooLarge { size: usize, limit: usize },

    /// Continuation key did not come from this table
    #[error("Invalid continuation key: {0}")]
    InvalidContinuation(String),

    /// Failed to read or persist backing data
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl TripstreamError {
    /// Short category label used in logs and status output
    pub fn kind(&self) -> &'static str {
        match self {
            TripstreamError::Configuration(_) => "configuration",
            TripstreamError::UpstreamRead(_) => "upstream_read",
            TripstreamError::EmptySource(_) => "empty_source",
            TripstreamError::MalformedRecord(_) => "malformed_record",
            TripstreamError::WriteRetryExhaustion { .. } => "write_retry_exhaustion",
            TripstreamError::Allocation(_) => "allocation",
            TripstreamError::Store(_) => "store",
            TripstreamError::Serialization(_) => "serialization",
            TripstreamError::Io(_) => "io",
            TripstreamError::Other(_) => "other",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for TripstreamError {
    fn from(err: std::io::Error) -> Self {
        TripstreamError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TripstreamError {
    fn from(err: serde_json::Error) -> Self {
        TripstreamError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TripstreamError {
    fn from(err: toml::de::Error) -> Self {
        TripstreamError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Envelope payloads that are not valid base64 are malformed records
impl From<base64::DecodeError> for TripstreamError {
    fn from(err: base64::DecodeError) -> Self {
        TripstreamError::MalformedRecord(format!("invalid base64 payload: {err}"))
    }
}
