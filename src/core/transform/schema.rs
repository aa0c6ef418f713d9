//! Per-category output descriptors
//!
//! A descriptor lists the output fields between `ID` and `Ingestion_Date`,
//! in table order, and the rule that derives each one from the parsed trip.
//! Source columns not named by any rule are dropped.

use crate::domain::TripCategory;

/// Storable type of a copied value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// String attribute
    Text,
    /// Number attribute
    Number,
}

/// How an output field is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Source value carried over unchanged
    Copy {
        source: &'static str,
        kind: ValueKind,
    },
    /// Minutes between two timestamps, rounded to 2 decimals
    Duration {
        pickup: &'static str,
        dropoff: &'static str,
    },
    /// Calendar date of a timestamp as `%Y-%m-%d`
    Date { pickup: &'static str },
    /// Code resolved through a named lookup table
    Lookup {
        source: &'static str,
        table: &'static str,
    },
    /// Sum of numeric sources rounded to 2 decimals; missing if any source is missing
    Sum { sources: &'static [&'static str] },
}

/// One output field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputField {
    pub name: &'static str,
    pub rule: FieldRule,
}

const fn text(name: &'static str) -> OutputField {
    OutputField {
        name,
        rule: FieldRule::Copy {
            source: name,
            kind: ValueKind::Text,
        },
    }
}

const fn number(name: &'static str) -> OutputField {
    OutputField {
        name,
        rule: FieldRule::Copy {
            source: name,
            kind: ValueKind::Number,
        },
    }
}

const fn lookup(name: &'static str, source: &'static str, table: &'static str) -> OutputField {
    OutputField {
        name,
        rule: FieldRule::Lookup { source, table },
    }
}

const fn duration(pickup: &'static str, dropoff: &'static str) -> OutputField {
    OutputField {
        name: "Trip_Duration",
        rule: FieldRule::Duration { pickup, dropoff },
    }
}

const fn date(pickup: &'static str) -> OutputField {
    OutputField {
        name: "date",
        rule: FieldRule::Date { pickup },
    }
}

const HVFHV_TOTAL_COMPONENTS: &[&str] = &[
    "base_passenger_fare",
    "tolls",
    "bcf",
    "sales_tax",
    "congestion_surcharge",
    "airport_fee",
    "tips",
];

const FHV_FIELDS: &[OutputField] = &[
    text("dispatching_base_num"),
    date("pickup_datetime"),
    lookup("SR_Flag", "SR_Flag", "shared_ride"),
    duration("pickup_datetime", "dropOff_datetime"),
];

const GREEN_FIELDS: &[OutputField] = &[
    lookup("Vendor", "VendorID", "vendor"),
    date("lpep_pickup_datetime"),
    lookup("RateCode", "RatecodeID", "rate_code"),
    lookup("Payment", "payment_type", "payment"),
    lookup("type_of_trip", "trip_type", "trip_type"),
    duration("lpep_pickup_datetime", "lpep_dropoff_datetime"),
    number("passenger_count"),
    number("trip_distance"),
    number("fare_amount"),
    number("extra"),
    number("mta_tax"),
    number("tip_amount"),
    number("tolls_amount"),
    number("improvement_surcharge"),
    number("total_amount"),
    number("congestion_surcharge"),
];

const HVFHV_FIELDS: &[OutputField] = &[
    lookup("hvfhs_license_num", "hvfhs_license_num", "platform"),
    date("pickup_datetime"),
    text("dispatching_base_num"),
    duration("pickup_datetime", "dropoff_datetime"),
    number("trip_miles"),
    number("trip_time"),
    number("tips"),
    OutputField {
        name: "trip_total_amount",
        rule: FieldRule::Sum {
            sources: HVFHV_TOTAL_COMPONENTS,
        },
    },
    lookup("shared_match_flag", "shared_match_flag", "shared_match"),
];

const YELLOW_FIELDS: &[OutputField] = &[
    lookup("Vendor", "VendorID", "vendor"),
    date("tpep_pickup_datetime"),
    lookup("RateCode", "RatecodeID", "rate_code"),
    lookup("Payment", "payment_type", "payment"),
    duration("tpep_pickup_datetime", "tpep_dropoff_datetime"),
    number("passenger_count"),
    number("trip_distance"),
    number("fare_amount"),
    number("extra"),
    number("mta_tax"),
    number("tip_amount"),
    number("tolls_amount"),
    number("improvement_surcharge"),
    number("total_amount"),
    number("congestion_surcharge"),
    number("airport_fee"),
];

/// Output descriptor of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySchema {
    pub category: TripCategory,
    pub fields: &'static [OutputField],
}

impl CategorySchema {
    /// Descriptor for a category
    pub fn for_category(category: TripCategory) -> Self {
        let fields = match category {
            TripCategory::Fhv => FHV_FIELDS,
            TripCategory::Green => GREEN_FIELDS,
            TripCategory::Hvfhv => HVFHV_FIELDS,
            TripCategory::Yellow => YELLOW_FIELDS,
        };
        Self { category, fields }
    }

    /// Lookup tables the descriptor resolves through
    pub fn lookup_tables(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter_map(|field| match field.rule {
                FieldRule::Lookup { table, .. } => Some(table),
                _ => None,
            })
            .collect()
    }
}
