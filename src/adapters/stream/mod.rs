//! Stream transport
//!
//! [`StreamSink`] receives published messages; [`DeliveryBatch`] is what a
//! consumer invocation is handed.

pub mod envelope;
pub mod sink;

pub use envelope::{decode_payload, DeliveryBatch, DeliveryRecord, StreamPayload};
pub use sink::{FileStreamSink, MemoryStreamSink, PutRecord, StreamSink};
