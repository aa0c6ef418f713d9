//! Code-to-label lookup tables
//!
//! Keys are canonical code strings: numeric codes are normalized so that
//! `1`, `"1"` and `1.0` all resolve through key `"1"`.

use crate::config::LookupTableConfig;
use crate::domain::{Code, Result, TripstreamError, NULL_SENTINEL};
use std::collections::BTreeMap;

/// Label used when an unmapped code falls back
pub const UNDEFINED_LABEL: &str = "Undefined";

/// A single named lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    name: String,
    entries: BTreeMap<String, String>,
    fallback: Option<String>,
}

impl LookupTable {
    /// Create a table from `(code, label)` pairs
    pub fn new<'a>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        fallback: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            entries: entries
                .into_iter()
                .map(|(code, label)| (normalize_key(code), label.to_string()))
                .collect(),
            fallback: fallback.map(str::to_string),
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fallback label, if any
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Resolve a code to its label
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` for an unmatched code when the table has no
    /// fallback. The null sentinel never fails: a table without an entry for
    /// it resolves it to [`UNDEFINED_LABEL`].
    pub fn resolve(&self, code: &Code) -> Result<String> {
        let key = code.key();
        if let Some(label) = self.entries.get(&key) {
            return Ok(label.clone());
        }
        match &self.fallback {
            Some(fallback) => Ok(fallback.clone()),
            None if key == NULL_SENTINEL => Ok(UNDEFINED_LABEL.to_string()),
            None => Err(TripstreamError::MalformedRecord(format!(
                "code '{key}' has no entry in lookup table {}",
                self.name
            ))),
        }
    }

    fn apply(&mut self, overrides: &LookupTableConfig) {
        for (code, label) in &overrides.entries {
            self.entries.insert(normalize_key(code), label.clone());
        }
        if let Some(fallback) = &overrides.fallback {
            self.fallback = Some(fallback.clone());
        }
    }
}

/// Canonical form of a configured code
fn normalize_key(code: &str) -> String {
    let trimmed = code.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            (value as i64).to_string()
        }
        Ok(value) => value.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Every lookup table by name
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTables {
    tables: BTreeMap<String, LookupTable>,
}

impl LookupTables {
    /// Built-in tables
    pub fn defaults() -> Self {
        let undefined = Some(UNDEFINED_LABEL);
        let tables = [
            LookupTable::new(
                "vendor",
                [("1", "Creative Mobile"), ("2", "VeriFone Inc"), ("0", UNDEFINED_LABEL)],
                undefined,
            ),
            LookupTable::new(
                "rate_code",
                [
                    ("1", "Standard rate"),
                    ("2", "JFK"),
                    ("3", "Newark"),
                    ("4", "Nassau or Westchester"),
                    ("5", "Negotiated fare"),
                    ("6", "Group ride"),
                    ("0", UNDEFINED_LABEL),
                ],
                undefined,
            ),
            LookupTable::new(
                "payment",
                [
                    ("1", "Credit card"),
                    ("2", "Cash"),
                    ("3", "No Charge"),
                    ("4", "Dispute"),
                    ("5", "Unknown"),
                    ("6", "Voided trip"),
                    ("0", UNDEFINED_LABEL),
                ],
                undefined,
            ),
            LookupTable::new(
                "platform",
                [
                    ("HV0002", "Juno"),
                    ("HV0003", "Uber"),
                    ("HV0004", "Via"),
                    ("HV0005", "Lyft"),
                ],
                undefined,
            ),
            LookupTable::new("trip_type", [("1", "Street hail"), ("2", "Dispatch")], None),
            LookupTable::new("shared_ride", [("1", "Shared"), ("0", "Non-Shared")], None),
            LookupTable::new("shared_match", [("N", "Not shared"), ("Y", "Shared")], None),
        ];

        Self {
            tables: tables
                .into_iter()
                .map(|table| (table.name.clone(), table))
                .collect(),
        }
    }

    /// Built-in tables with configured entries and fallbacks applied on top
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an override naming an unknown table.
    pub fn with_overrides(overrides: &BTreeMap<String, LookupTableConfig>) -> Result<Self> {
        let mut tables = Self::defaults();
        for (name, config) in overrides {
            let table = tables.tables.get_mut(name).ok_or_else(|| {
                TripstreamError::Configuration(format!("Unknown lookup table '{name}'"))
            })?;
            table.apply(config);
            tracing::debug!(table = %name, entries = config.entries.len(), "Applied lookup overrides");
        }
        Ok(tables)
    }

    /// Table by name
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if no such table exists.
    pub fn get(&self, name: &str) -> Result<&LookupTable> {
        self.tables
            .get(name)
            .ok_or_else(|| TripstreamError::Configuration(format!("Unknown lookup table '{name}'")))
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("vendor", Code::Int(2), "VeriFone Inc")]
    #[test_case("vendor", Code::Int(7), "Undefined")]
    #[test_case("rate_code", Code::Int(99), "Undefined")]
    #[test_case("payment", Code::Int(0), "Undefined")]
    #[test_case("platform", Code::Text("HV0003".to_string()), "Uber")]
    #[test_case("platform", Code::Text("HV0009".to_string()), "Undefined")]
    #[test_case("shared_ride", Code::Int(0), "Non-Shared")]
    #[test_case("shared_match", Code::Text("Y".to_string()), "Shared")]
    fn test_default_resolution(table: &str, code: Code, expected: &str) {
        let tables = LookupTables::defaults();
        assert_eq!(tables.get(table).unwrap().resolve(&code).unwrap(), expected);
    }

    #[test]
    fn test_unmatched_without_fallback_is_malformed() {
        let tables = LookupTables::defaults();
        let err = tables
            .get("trip_type")
            .unwrap()
            .resolve(&Code::Int(3))
            .unwrap_err();
        assert!(matches!(err, TripstreamError::MalformedRecord(_)));
    }

    #[test_case("trip_type", Code::Int(0))]
    #[test_case("shared_match", Code::Int(0))]
    #[test_case("shared_match", Code::Text("0".to_string()))]
    fn test_null_sentinel_without_fallback_is_undefined(table: &str, code: Code) {
        let tables = LookupTables::defaults();
        assert_eq!(tables.get(table).unwrap().resolve(&code).unwrap(), UNDEFINED_LABEL);
    }

    #[test]
    fn test_null_sentinel_keeps_explicit_entry() {
        let tables = LookupTables::defaults();
        let shared_ride = tables.get("shared_ride").unwrap();
        assert_eq!(shared_ride.resolve(&Code::Int(0)).unwrap(), "Non-Shared");
    }

    #[test]
    fn test_overrides_normalize_keys_and_set_fallback() {
        let overrides = BTreeMap::from([(
            "trip_type".to_string(),
            LookupTableConfig {
                entries: BTreeMap::from([("3.0".to_string(), "Shuttle".to_string())]),
                fallback: Some("Other".to_string()),
            },
        )]);
        let tables = LookupTables::with_overrides(&overrides).unwrap();
        let trip_type = tables.get("trip_type").unwrap();

        assert_eq!(trip_type.resolve(&Code::Int(3)).unwrap(), "Shuttle");
        assert_eq!(trip_type.resolve(&Code::Int(1)).unwrap(), "Street hail");
        assert_eq!(trip_type.resolve(&Code::Int(9)).unwrap(), "Other");
    }

    #[test]
    fn test_override_unknown_table() {
        let overrides = BTreeMap::from([("colour".to_string(), LookupTableConfig::default())]);
        assert!(LookupTables::with_overrides(&overrides).is_err());
    }
}
