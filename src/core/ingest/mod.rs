//! Stream ingestion
//!
//! - [`writer`] - Chunked durable writes with bounded retry
//! - [`consumer`] - Delivery batch handling
//! - [`summary`] - Invocation reporting

pub mod consumer;
pub mod summary;
pub mod writer;

pub use consumer::{InvocationResponse, StreamConsumer};
pub use summary::{ConsumeSummary, SkippedEvent};
pub use writer::{BatchWriter, WriteResult, WriterSettings};
