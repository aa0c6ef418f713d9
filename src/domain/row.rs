//! Source rows and checkpoint records
//!
//! A [`SourceRow`] is one row of a bulk dataset exactly as read. Before it can
//! be compared with the checkpoint it is normalized: nulls become the `"0"`
//! sentinel and every value becomes a string. Checkpoint items are stored in
//! that normalized form, so both sides must agree on these rules or dedup
//! silently stops matching.

use super::errors::TripstreamError;
use super::record::{AttributeValue, Item, ID_ATTRIBUTE};
use super::Result;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Value substituted for null or missing fields during normalization
pub const NULL_SENTINEL: &str = "0";

/// One row of a tabular dataset, field order preserved
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceRow {
    fields: Map<String, Value>,
}

impl SourceRow {
    /// Creates a row from a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Creates a row from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(TripstreamError::UpstreamRead(format!(
                "expected a JSON object per row, got {other}"
            ))),
        }
    }

    /// Field values by name
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the row and returns its fields
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Normalizes the row for checkpoint comparison
    ///
    /// # Examples
    ///
    /// ```
    /// use tripstream::domain::SourceRow;
    /// use serde_json::json;
    ///
    /// let row = SourceRow::from_value(json!({"VendorID": 2, "ehail_fee": null})).unwrap();
    /// let normalized = row.normalize();
    /// assert_eq!(normalized.get("VendorID"), Some("2"));
    /// assert_eq!(normalized.get("ehail_fee"), Some("0"));
    /// ```
    pub fn normalize(&self) -> NormalizedRow {
        let columns = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), normalize_value(value)))
            .collect();
        NormalizedRow { columns }
    }
}

fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => NULL_SENTINEL.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Nested values are not expected in tabular data; keep their JSON text
        other => other.to_string(),
    }
}

/// A source row with every value coerced to a string
///
/// Equality ignores column order, since checkpoint items come back from the
/// store with their attributes sorted by name.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRow {
    columns: Vec<(String, String)>,
}

impl NormalizedRow {
    /// Creates a row from ordered columns
    pub fn from_columns(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Columns in their original order
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// Value of a column
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }

    /// Order-independent identity used for multiset counting
    pub fn identity(&self) -> Vec<(String, String)> {
        let mut identity = self.columns.clone();
        identity.sort();
        identity
    }

    /// Converts the row back into a source row of string values
    pub fn to_source_row(&self) -> SourceRow {
        let fields = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        SourceRow::new(fields)
    }

    /// Attaches a freshly generated opaque key
    pub fn into_checkpoint(self) -> CheckpointRecord {
        CheckpointRecord {
            key: Uuid::new_v4().to_string(),
            row: self,
        }
    }
}

impl PartialEq for NormalizedRow {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for NormalizedRow {}

/// A sampled row as recorded in the checkpoint, with its opaque key
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord {
    /// Opaque unique key (UUID v4)
    pub key: String,

    /// The normalized row
    pub row: NormalizedRow,
}

impl CheckpointRecord {
    /// Encodes the record as a store item: every column as a string
    /// attribute plus the `ID` key
    ///
    /// The key overwrites a column named `ID`; the sampler rejects such
    /// source rows before they get here.
    pub fn to_item(&self) -> Item {
        let mut item: Item = self
            .row
            .columns()
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::s(value.clone())))
            .collect();
        item.insert(ID_ATTRIBUTE.to_string(), AttributeValue::s(self.key.clone()));
        item
    }

    /// Decodes a checkpoint item
    ///
    /// # Errors
    ///
    /// Returns `UpstreamRead` if the item has no `ID` attribute.
    pub fn from_item(item: &Item) -> Result<Self> {
        let key = item
            .get(ID_ATTRIBUTE)
            .map(|value| value.as_str().to_string())
            .ok_or_else(|| {
                TripstreamError::UpstreamRead("checkpoint item is missing its ID".to_string())
            })?;

        let columns = item
            .iter()
            .filter(|(name, _)| name.as_str() != ID_ATTRIBUTE)
            .map(|(name, value)| (name.clone(), value.as_str().to_string()))
            .collect();

        Ok(Self {
            key,
            row: NormalizedRow::from_columns(columns),
        })
    }
}
