//! Store items, stream events and enriched records
//!
//! Items use the key-value store's typed attribute encoding: every value is
//! either `{"S": string}` or `{"N": numeric string}`.

use super::category::TripCategory;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the key attribute in every table
pub const ID_ATTRIBUTE: &str = "ID";

/// Name of the ingestion date attribute in target tables
pub const INGESTION_DATE_ATTRIBUTE: &str = "Ingestion_Date";

/// A typed attribute value
///
/// Serializes to the store's wire form:
///
/// ```
/// use tripstream::domain::AttributeValue;
///
/// let value = AttributeValue::n(42u64);
/// assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"N":"42"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String attribute
    #[serde(rename = "S")]
    S(String),
    /// Number attribute carried as its decimal string
    #[serde(rename = "N")]
    N(String),
}

impl AttributeValue {
    /// Creates a string attribute
    pub fn s(value: impl Into<String>) -> Self {
        AttributeValue::S(value.into())
    }

    /// Creates a number attribute
    pub fn n(value: impl fmt::Display) -> Self {
        AttributeValue::N(value.to_string())
    }

    /// Raw textual content regardless of type
    pub fn as_str(&self) -> &str {
        match self {
            AttributeValue::S(s) | AttributeValue::N(s) => s,
        }
    }

    /// Parses a number attribute as an unsigned integer
    ///
    /// Returns `None` for string attributes or non-integral numbers.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::N(n) => n.trim().parse().ok(),
            AttributeValue::S(_) => None,
        }
    }
}

/// A store item: attribute name to typed value
pub type Item = BTreeMap<String, AttributeValue>;

/// One decoded stream message carrying a raw trip
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Position of the event in its delivery batch
    pub sequence: usize,

    /// Decoded JSON object
    pub payload: Map<String, Value>,
}

impl StreamEvent {
    /// Creates a stream event from a decoded JSON object
    pub fn new(sequence: usize, payload: Map<String, Value>) -> Self {
        Self { sequence, payload }
    }
}

/// The transformer's output for a single trip, with its assigned ID
///
/// Fields are kept in the category's output order. `ID` is always first
/// and `Ingestion_Date` always last.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// Category the record belongs to
    pub category: TripCategory,

    /// Sequential identifier, unique within the category's target table
    pub id: u64,

    /// Ordered output fields
    pub fields: Vec<(String, AttributeValue)>,
}

impl EnrichedRecord {
    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field names in output order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Converts the record into a store item
    pub fn to_item(&self) -> Item {
        self.fields.iter().cloned().collect()
    }
}
