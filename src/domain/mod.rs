//! Domain models and types for tripstream.
//!
//! This module contains the core domain types shared by every pipeline stage.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Trip categories** ([`TripCategory`])
//! - **Source and checkpoint rows** ([`SourceRow`], [`NormalizedRow`], [`CheckpointRecord`])
//! - **Typed trips** ([`TripRecord`]) parsed from [`StreamEvent`]s
//! - **Store items** ([`Item`], [`AttributeValue`]) and [`EnrichedRecord`]s
//! - **Error types** ([`TripstreamError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TripstreamError>`]:
//!
//! ```rust
//! use tripstream::domain::{Result, SourceRow};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let row = SourceRow::from_value(json!({"VendorID": 1}))?;
//!     assert_eq!(row.normalize().get("VendorID"), Some("1"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod category;
pub mod errors;
pub mod record;
pub mod result;
pub mod row;
pub mod trips;

// Re-export commonly used types for convenience
pub use category::TripCategory;
pub use errors::{StoreError, TripstreamError};
pub use record::{
    AttributeValue, EnrichedRecord, Item, StreamEvent, ID_ATTRIBUTE, INGESTION_DATE_ATTRIBUTE,
};
pub use result::Result;
pub use row::{CheckpointRecord, NormalizedRow, SourceRow, NULL_SENTINEL};
pub use trips::{Code, FieldMap, FieldValue, TripRecord, TIMESTAMP_FORMAT};
