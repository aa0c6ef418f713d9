//! Strongly-typed trip records
//!
//! Each category has its own record type, parsed from a stream event's JSON
//! payload. Parsing is the schema validation step: required timestamps must
//! match [`TIMESTAMP_FORMAT`], numeric fields must be numbers (or numeric
//! strings, as the sampler writes every value as a string), and unknown
//! columns are ignored.

use super::category::TripCategory;
use super::errors::TripstreamError;
use super::record::StreamEvent;
use super::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Literal timestamp format of every pickup/dropoff field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A coded value used as a lookup key
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    /// Integral numeric code (`1`, `"1"` and `1.0` all parse to `Int(1)`)
    Int(i64),
    /// Non-integral numeric code
    Float(f64),
    /// Textual code such as `"HV0003"` or `"N"`
    Text(String),
}

impl Code {
    /// Canonical string form used as a lookup key
    pub fn key(&self) -> String {
        match self {
            Code::Int(i) => i.to_string(),
            Code::Float(f) => f.to_string(),
            Code::Text(s) => s.clone(),
        }
    }

    fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Code::Int(value as i64)
        } else {
            Code::Float(value)
        }
    }
}

/// A typed field value handed to the transform engine
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// Numeric measurement or amount
    Number(f64),
    /// Lookup code
    Code(Code),
    /// Parsed timestamp
    Timestamp(NaiveDateTime),
    /// Absent or null
    Missing,
}

impl FieldValue {
    fn text(value: &Option<String>) -> Self {
        value.clone().map_or(FieldValue::Missing, FieldValue::Text)
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Number)
    }

    fn code(value: &Option<Code>) -> Self {
        value.clone().map_or(FieldValue::Missing, FieldValue::Code)
    }
}

/// Typed fields by source column name
pub type FieldMap = BTreeMap<&'static str, FieldValue>;

/// For-hire vehicle trip
#[derive(Debug, Clone, Deserialize)]
pub struct FhvTrip {
    #[serde(default, deserialize_with = "opt_text")]
    pub dispatching_base_num: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub pickup_datetime: NaiveDateTime,
    #[serde(rename = "dropOff_datetime", deserialize_with = "timestamp")]
    pub dropoff_datetime: NaiveDateTime,
    #[serde(rename = "PUlocationID", default, deserialize_with = "opt_number")]
    pub pu_location_id: Option<f64>,
    #[serde(rename = "DOlocationID", default, deserialize_with = "opt_number")]
    pub do_location_id: Option<f64>,
    #[serde(rename = "SR_Flag", default, deserialize_with = "opt_code")]
    pub sr_flag: Option<Code>,
    #[serde(rename = "Affiliated_base_number", default, deserialize_with = "opt_text")]
    pub affiliated_base_number: Option<String>,
}

/// Green taxi trip
#[derive(Debug, Clone, Deserialize)]
pub struct GreenTrip {
    #[serde(rename = "VendorID", default, deserialize_with = "opt_code")]
    pub vendor_id: Option<Code>,
    #[serde(deserialize_with = "timestamp")]
    pub lpep_pickup_datetime: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub lpep_dropoff_datetime: NaiveDateTime,
    #[serde(default, deserialize_with = "opt_text")]
    pub store_and_fwd_flag: Option<String>,
    #[serde(rename = "RatecodeID", default, deserialize_with = "opt_code")]
    pub ratecode_id: Option<Code>,
    #[serde(rename = "PULocationID", default, deserialize_with = "opt_number")]
    pub pu_location_id: Option<f64>,
    #[serde(rename = "DOLocationID", default, deserialize_with = "opt_number")]
    pub do_location_id: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub passenger_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub trip_distance: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub fare_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub extra: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub mta_tax: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tip_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tolls_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub ehail_fee: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub improvement_surcharge: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_code")]
    pub payment_type: Option<Code>,
    #[serde(default, deserialize_with = "opt_code")]
    pub trip_type: Option<Code>,
    #[serde(default, deserialize_with = "opt_number")]
    pub congestion_surcharge: Option<f64>,
}

/// High-volume for-hire vehicle trip
#[derive(Debug, Clone, Deserialize)]
pub struct HvfhvTrip {
    #[serde(default, deserialize_with = "opt_code")]
    pub hvfhs_license_num: Option<Code>,
    #[serde(default, deserialize_with = "opt_text")]
    pub dispatching_base_num: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub originating_base_num: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub on_scene_datetime: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub pickup_datetime: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub dropoff_datetime: NaiveDateTime,
    #[serde(rename = "PULocationID", default, deserialize_with = "opt_number")]
    pub pu_location_id: Option<f64>,
    #[serde(rename = "DOLocationID", default, deserialize_with = "opt_number")]
    pub do_location_id: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub trip_miles: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub trip_time: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub base_passenger_fare: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tolls: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub bcf: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub sales_tax: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub congestion_surcharge: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub airport_fee: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tips: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub driver_pay: Option<f64>,
    #[serde(default, deserialize_with = "opt_text")]
    pub shared_request_flag: Option<String>,
    #[serde(default, deserialize_with = "opt_code")]
    pub shared_match_flag: Option<Code>,
    #[serde(default, deserialize_with = "opt_text")]
    pub access_a_ride_flag: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub wav_request_flag: Option<String>,
}

/// Yellow taxi trip
#[derive(Debug, Clone, Deserialize)]
pub struct YellowTrip {
    #[serde(rename = "VendorID", default, deserialize_with = "opt_code")]
    pub vendor_id: Option<Code>,
    #[serde(deserialize_with = "timestamp")]
    pub tpep_pickup_datetime: NaiveDateTime,
    #[serde(deserialize_with = "timestamp")]
    pub tpep_dropoff_datetime: NaiveDateTime,
    #[serde(default, deserialize_with = "opt_number")]
    pub passenger_count: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub trip_distance: Option<f64>,
    #[serde(rename = "RatecodeID", default, deserialize_with = "opt_code")]
    pub ratecode_id: Option<Code>,
    #[serde(default, deserialize_with = "opt_text")]
    pub store_and_fwd_flag: Option<String>,
    #[serde(rename = "PULocationID", default, deserialize_with = "opt_number")]
    pub pu_location_id: Option<f64>,
    #[serde(rename = "DOLocationID", default, deserialize_with = "opt_number")]
    pub do_location_id: Option<f64>,
    #[serde(default, deserialize_with = "opt_code")]
    pub payment_type: Option<Code>,
    #[serde(default, deserialize_with = "opt_number")]
    pub fare_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub extra: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub mta_tax: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tip_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub tolls_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub improvement_surcharge: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub congestion_surcharge: Option<f64>,
    #[serde(default, deserialize_with = "opt_number")]
    pub airport_fee: Option<f64>,
}

/// A parsed trip of any category
#[derive(Debug, Clone)]
pub enum TripRecord {
    Fhv(FhvTrip),
    Green(GreenTrip),
    Hvfhv(HvfhvTrip),
    Yellow(YellowTrip),
}

impl TripRecord {
    /// Parses a stream event as a trip of the given category
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if a required field is absent or a field
    /// cannot be parsed as its declared type.
    pub fn parse(category: TripCategory, event: &StreamEvent) -> Result<Self> {
        Self::from_payload(category, &event.payload).map_err(|e| match e {
            TripstreamError::MalformedRecord(msg) => {
                TripstreamError::MalformedRecord(format!("event {}: {msg}", event.sequence))
            }
            other => other,
        })
    }

    /// Parses a JSON object as a trip of the given category
    pub fn from_payload(category: TripCategory, payload: &Map<String, Value>) -> Result<Self> {
        let value = Value::Object(payload.clone());
        let record = match category {
            TripCategory::Fhv => serde_json::from_value(value).map(TripRecord::Fhv),
            TripCategory::Green => serde_json::from_value(value).map(TripRecord::Green),
            TripCategory::Hvfhv => serde_json::from_value(value).map(TripRecord::Hvfhv),
            TripCategory::Yellow => serde_json::from_value(value).map(TripRecord::Yellow),
        };
        record.map_err(|e| TripstreamError::MalformedRecord(format!("{category} trip: {e}")))
    }

    /// Category of the record
    pub fn category(&self) -> TripCategory {
        match self {
            TripRecord::Fhv(_) => TripCategory::Fhv,
            TripRecord::Green(_) => TripCategory::Green,
            TripRecord::Hvfhv(_) => TripCategory::Hvfhv,
            TripRecord::Yellow(_) => TripCategory::Yellow,
        }
    }

    /// Typed fields keyed by their source column names
    pub fn fields(&self) -> FieldMap {
        match self {
            TripRecord::Fhv(t) => FieldMap::from([
                ("dispatching_base_num", FieldValue::text(&t.dispatching_base_num)),
                ("pickup_datetime", FieldValue::Timestamp(t.pickup_datetime)),
                ("dropOff_datetime", FieldValue::Timestamp(t.dropoff_datetime)),
                ("PUlocationID", FieldValue::number(t.pu_location_id)),
                ("DOlocationID", FieldValue::number(t.do_location_id)),
                ("SR_Flag", FieldValue::code(&t.sr_flag)),
                ("Affiliated_base_number", FieldValue::text(&t.affiliated_base_number)),
            ]),
            TripRecord::Green(t) => FieldMap::from([
                ("VendorID", FieldValue::code(&t.vendor_id)),
                ("lpep_pickup_datetime", FieldValue::Timestamp(t.lpep_pickup_datetime)),
                ("lpep_dropoff_datetime", FieldValue::Timestamp(t.lpep_dropoff_datetime)),
                ("store_and_fwd_flag", FieldValue::text(&t.store_and_fwd_flag)),
                ("RatecodeID", FieldValue::code(&t.ratecode_id)),
                ("PULocationID", FieldValue::number(t.pu_location_id)),
                ("DOLocationID", FieldValue::number(t.do_location_id)),
                ("passenger_count", FieldValue::number(t.passenger_count)),
                ("trip_distance", FieldValue::number(t.trip_distance)),
                ("fare_amount", FieldValue::number(t.fare_amount)),
                ("extra", FieldValue::number(t.extra)),
                ("mta_tax", FieldValue::number(t.mta_tax)),
                ("tip_amount", FieldValue::number(t.tip_amount)),
                ("tolls_amount", FieldValue::number(t.tolls_amount)),
                ("ehail_fee", FieldValue::number(t.ehail_fee)),
                ("improvement_surcharge", FieldValue::number(t.improvement_surcharge)),
                ("total_amount", FieldValue::number(t.total_amount)),
                ("payment_type", FieldValue::code(&t.payment_type)),
                ("trip_type", FieldValue::code(&t.trip_type)),
                ("congestion_surcharge", FieldValue::number(t.congestion_surcharge)),
            ]),
            TripRecord::Hvfhv(t) => FieldMap::from([
                ("hvfhs_license_num", FieldValue::code(&t.hvfhs_license_num)),
                ("dispatching_base_num", FieldValue::text(&t.dispatching_base_num)),
                ("originating_base_num", FieldValue::text(&t.originating_base_num)),
                ("on_scene_datetime", FieldValue::text(&t.on_scene_datetime)),
                ("pickup_datetime", FieldValue::Timestamp(t.pickup_datetime)),
                ("dropoff_datetime", FieldValue::Timestamp(t.dropoff_datetime)),
                ("PULocationID", FieldValue::number(t.pu_location_id)),
                ("DOLocationID", FieldValue::number(t.do_location_id)),
                ("trip_miles", FieldValue::number(t.trip_miles)),
                ("trip_time", FieldValue::number(t.trip_time)),
                ("base_passenger_fare", FieldValue::number(t.base_passenger_fare)),
                ("tolls", FieldValue::number(t.tolls)),
                ("bcf", FieldValue::number(t.bcf)),
                ("sales_tax", FieldValue::number(t.sales_tax)),
                ("congestion_surcharge", FieldValue::number(t.congestion_surcharge)),
                ("airport_fee", FieldValue::number(t.airport_fee)),
                ("tips", FieldValue::number(t.tips)),
                ("driver_pay", FieldValue::number(t.driver_pay)),
                ("shared_request_flag", FieldValue::text(&t.shared_request_flag)),
                ("shared_match_flag", FieldValue::code(&t.shared_match_flag)),
                ("access_a_ride_flag", FieldValue::text(&t.access_a_ride_flag)),
                ("wav_request_flag", FieldValue::text(&t.wav_request_flag)),
            ]),
            TripRecord::Yellow(t) => FieldMap::from([
                ("VendorID", FieldValue::code(&t.vendor_id)),
                ("tpep_pickup_datetime", FieldValue::Timestamp(t.tpep_pickup_datetime)),
                ("tpep_dropoff_datetime", FieldValue::Timestamp(t.tpep_dropoff_datetime)),
                ("passenger_count", FieldValue::number(t.passenger_count)),
                ("trip_distance", FieldValue::number(t.trip_distance)),
                ("RatecodeID", FieldValue::code(&t.ratecode_id)),
                ("store_and_fwd_flag", FieldValue::text(&t.store_and_fwd_flag)),
                ("PULocationID", FieldValue::number(t.pu_location_id)),
                ("DOLocationID", FieldValue::number(t.do_location_id)),
                ("payment_type", FieldValue::code(&t.payment_type)),
                ("fare_amount", FieldValue::number(t.fare_amount)),
                ("extra", FieldValue::number(t.extra)),
                ("mta_tax", FieldValue::number(t.mta_tax)),
                ("tip_amount", FieldValue::number(t.tip_amount)),
                ("tolls_amount", FieldValue::number(t.tolls_amount)),
                ("improvement_surcharge", FieldValue::number(t.improvement_surcharge)),
                ("total_amount", FieldValue::number(t.total_amount)),
                ("congestion_surcharge", FieldValue::number(t.congestion_surcharge)),
                ("airport_fee", FieldValue::number(t.airport_fee)),
            ]),
        }
    }
}

fn timestamp<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        serde::de::Error::custom(format!(
            "timestamp '{raw}' does not match {TIMESTAMP_FORMAT}: {e}"
        ))
    })
}

fn opt_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("number {n} is out of range"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {other}"
        ))),
    }
}

fn opt_code<'de, D>(deserializer: D) -> std::result::Result<Option<Code>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Some(Code::Int(i))),
            (None, Some(f)) => Ok(Some(Code::from_f64(f))),
            _ => Err(serde::de::Error::custom(format!("code {n} is out of range"))),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if let Ok(f) = trimmed.parse::<f64>() {
                Ok(Some(Code::from_f64(f)))
            } else {
                Ok(Some(Code::Text(trimmed.to_string())))
            }
        }
        Some(Value::Bool(b)) => Ok(Some(Code::Int(i64::from(b)))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a code, got {other}"
        ))),
    }
}

fn opt_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text, got {other}"
        ))),
    }
}
