//! Record transformation
//!
//! Each category has a fixed output descriptor ([`schema`]), a set of code
//! lookup tables ([`lookup`]) and one engine that applies them ([`engine`]).
//!
//! # Example
//!
//! ```
//! use tripstream::core::transform::{LookupTables, RecordTransformer};
//! use tripstream::domain::{StreamEvent, TripCategory};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transformer = RecordTransformer::new(TripCategory::Fhv, LookupTables::defaults())?;
//! let payload = json!({
//!     "dispatching_base_num": "B00013",
//!     "pickup_datetime": "2023-01-01 00:01:00",
//!     "dropOff_datetime": "2023-01-01 00:31:00",
//!     "SR_Flag": "1"
//! });
//! let event = StreamEvent::new(0, payload.as_object().cloned().unwrap_or_default());
//!
//! let record = transformer.transform_with_id(&event, 1)?;
//! assert_eq!(record.get("SR_Flag").map(|v| v.as_str()), Some("Shared"));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod lookup;
pub mod schema;

pub use engine::{PendingRecord, RecordTransformer};
pub use lookup::{LookupTable, LookupTables};
pub use schema::{CategorySchema, FieldRule, OutputField, ValueKind};
