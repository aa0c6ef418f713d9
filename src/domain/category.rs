//! Trip category identifiers
//!
//! Each category runs the same pipeline against its own source file,
//! checkpoint table and target table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxi trip category
///
/// # Examples
///
/// ```
/// use tripstream::domain::TripCategory;
/// use std::str::FromStr;
///
/// let category = TripCategory::from_str("hvfhv").unwrap();
/// assert_eq!(category, TripCategory::Hvfhv);
/// assert_eq!(category.default_target_table(), "HvfhvTable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripCategory {
    /// For-hire vehicles
    Fhv,
    /// Green (boro) taxis
    Green,
    /// High-volume for-hire vehicles
    Hvfhv,
    /// Yellow medallion taxis
    Yellow,
}

impl TripCategory {
    /// All categories, in a stable order
    pub const ALL: [TripCategory; 4] = [
        TripCategory::Fhv,
        TripCategory::Green,
        TripCategory::Hvfhv,
        TripCategory::Yellow,
    ];

    /// Lowercase name used in config files and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            TripCategory::Fhv => "fhv",
            TripCategory::Green => "green",
            TripCategory::Hvfhv => "hvfhv",
            TripCategory::Yellow => "yellow",
        }
    }

    /// Default name of the bulk source dataset
    pub fn default_source_name(&self) -> String {
        format!("{}_final.jsonl", self.as_str())
    }

    /// Default name of the sampled snapshot artifact
    pub fn default_snapshot_name(&self) -> String {
        format!("{}batch.jsonl", self.as_str())
    }

    /// Default checkpoint table name
    pub fn default_checkpoint_table(&self) -> String {
        format!("{}CheckPoint", self.title())
    }

    /// Default target table name
    pub fn default_target_table(&self) -> String {
        format!("{}Table", self.title())
    }

    fn title(&self) -> &'static str {
        match self {
            TripCategory::Fhv => "Fhv",
            TripCategory::Green => "Green",
            TripCategory::Hvfhv => "Hvfhv",
            TripCategory::Yellow => "Yellow",
        }
    }
}

impl fmt::Display for TripCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fhv" => Ok(TripCategory::Fhv),
            "green" => Ok(TripCategory::Green),
            "hvfhv" | "fhvhv" => Ok(TripCategory::Hvfhv),
            "yellow" => Ok(TripCategory::Yellow),
            other => Err(format!(
                "Invalid trip category '{other}'. Must be one of: fhv, green, hvfhv, yellow"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("fhv", TripCategory::Fhv)]
    #[test_case("Green", TripCategory::Green)]
    #[test_case("fhvhv", TripCategory::Hvfhv)]
    #[test_case(" YELLOW ", TripCategory::Yellow)]
    fn test_category_from_str(input: &str, expected: TripCategory) {
        assert_eq!(TripCategory::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_category_from_str_invalid() {
        assert!(TripCategory::from_str("limo").is_err());
    }

    #[test]
    fn test_default_names() {
        assert_eq!(TripCategory::Fhv.default_checkpoint_table(), "FhvCheckPoint");
        assert_eq!(TripCategory::Green.default_target_table(), "GreenTable");
        assert_eq!(TripCategory::Yellow.default_source_name(), "yellow_final.jsonl");
        assert_eq!(TripCategory::Hvfhv.default_snapshot_name(), "hvfhvbatch.jsonl");
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&TripCategory::Hvfhv).unwrap();
        assert_eq!(json, "\"hvfhv\"");
    }
}
