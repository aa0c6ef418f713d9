//! Category transform engine
//!
//! Turns a decoded stream event into the ordered, typed fields of its
//! target-table item. The transform is pure apart from reading the clock for
//! `Ingestion_Date`, which can be pinned with [`RecordTransformer::with_ingestion_date`].

use super::lookup::LookupTables;
use super::schema::{CategorySchema, FieldRule, ValueKind};
use crate::domain::{
    AttributeValue, Code, EnrichedRecord, FieldMap, FieldValue, Result, StreamEvent,
    TripCategory, TripRecord, TripstreamError, ID_ATTRIBUTE, INGESTION_DATE_ATTRIBUTE,
};
use chrono::{Local, NaiveDate};

/// Format of the `date` output field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of the `Ingestion_Date` output field
pub const INGESTION_DATE_FORMAT: &str = "%d/%m/%Y";

/// A transformed record still waiting for its ID
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub category: TripCategory,
    pub sequence: usize,
    pub fields: Vec<(String, AttributeValue)>,
    pub ingestion_date: String,
}

impl PendingRecord {
    /// Attach an ID, placing it first and `Ingestion_Date` last
    pub fn with_id(self, id: u64) -> EnrichedRecord {
        let mut fields = Vec::with_capacity(self.fields.len() + 2);
        fields.push((ID_ATTRIBUTE.to_string(), AttributeValue::n(id)));
        fields.extend(self.fields);
        fields.push((
            INGESTION_DATE_ATTRIBUTE.to_string(),
            AttributeValue::s(self.ingestion_date),
        ));

        EnrichedRecord {
            category: self.category,
            id,
            fields,
        }
    }
}

/// Transformer for one category
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    schema: CategorySchema,
    lookups: LookupTables,
    ingestion_date: Option<NaiveDate>,
}

impl RecordTransformer {
    /// Create a transformer
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a lookup table the category needs is missing.
    pub fn new(category: TripCategory, lookups: LookupTables) -> Result<Self> {
        let schema = CategorySchema::for_category(category);
        for table in schema.lookup_tables() {
            lookups.get(table)?;
        }
        Ok(Self {
            schema,
            lookups,
            ingestion_date: None,
        })
    }

    /// Use a fixed ingestion date instead of today's local date
    pub fn with_ingestion_date(mut self, date: NaiveDate) -> Self {
        self.ingestion_date = Some(date);
        self
    }

    /// Category handled by this transformer
    pub fn category(&self) -> TripCategory {
        self.schema.category
    }

    /// Transform one event
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the event fails to parse or a code has no
    /// lookup entry and no fallback.
    pub fn transform(&self, event: &StreamEvent) -> Result<PendingRecord> {
        let trip = TripRecord::parse(self.schema.category, event)?;
        let source = trip.fields();

        let fields = self
            .schema
            .fields
            .iter()
            .map(|field| {
                self.derive(&source, field.rule)
                    .map(|value| (field.name.to_string(), value))
                    .map_err(|e| match e {
                        TripstreamError::MalformedRecord(msg) => TripstreamError::MalformedRecord(
                            format!("event {} field {}: {msg}", event.sequence, field.name),
                        ),
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let ingestion_date = self
            .ingestion_date
            .unwrap_or_else(|| Local::now().date_naive())
            .format(INGESTION_DATE_FORMAT)
            .to_string();

        Ok(PendingRecord {
            category: self.schema.category,
            sequence: event.sequence,
            fields,
            ingestion_date,
        })
    }

    /// Transform one event and attach an ID
    pub fn transform_with_id(&self, event: &StreamEvent, id: u64) -> Result<EnrichedRecord> {
        self.transform(event).map(|pending| pending.with_id(id))
    }

    fn derive(&self, source: &FieldMap, rule: FieldRule) -> Result<AttributeValue> {
        let value = match rule {
            FieldRule::Copy { source: name, kind } => copy(field(source, name), kind),
            FieldRule::Duration { pickup, dropoff } => {
                match (field(source, pickup), field(source, dropoff)) {
                    (FieldValue::Timestamp(start), FieldValue::Timestamp(end)) => {
                        let minutes = (*end - *start).num_seconds() as f64 / 60.0;
                        Some(AttributeValue::n(render_number(round2(minutes))))
                    }
                    _ => None,
                }
            }
            FieldRule::Date { pickup } => match field(source, pickup) {
                FieldValue::Timestamp(ts) => Some(AttributeValue::s(ts.format(DATE_FORMAT).to_string())),
                _ => None,
            },
            FieldRule::Lookup { source: name, table } => {
                let code = match field(source, name) {
                    FieldValue::Code(code) => Some(code.clone()),
                    FieldValue::Text(text) => Some(Code::Text(text.clone())),
                    _ => None,
                };
                match code {
                    Some(code) => Some(AttributeValue::s(self.lookups.get(table)?.resolve(&code)?)),
                    None => None,
                }
            }
            FieldRule::Sum { sources } => sources
                .iter()
                .map(|name| as_number(field(source, name)))
                .sum::<Option<f64>>()
                .map(|total| AttributeValue::n(render_number(round2(total)))),
        };

        Ok(value.unwrap_or_else(|| AttributeValue::s("")))
    }
}

fn field<'a>(source: &'a FieldMap, name: &str) -> &'a FieldValue {
    source.get(name).unwrap_or(&FieldValue::Missing)
}

fn copy(value: &FieldValue, kind: ValueKind) -> Option<AttributeValue> {
    match kind {
        ValueKind::Number => as_number(value).map(|n| AttributeValue::n(render_number(n))),
        ValueKind::Text => match value {
            FieldValue::Text(text) => Some(AttributeValue::s(text.clone())),
            FieldValue::Code(code) => Some(AttributeValue::s(code.key())),
            FieldValue::Number(n) => Some(AttributeValue::s(render_number(*n))),
            FieldValue::Timestamp(ts) => Some(AttributeValue::s(
                ts.format(crate::domain::TIMESTAMP_FORMAT).to_string(),
            )),
            FieldValue::Missing => None,
        },
    }
}

fn as_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Code(Code::Int(i)) => Some(*i as f64),
        FieldValue::Code(Code::Float(f)) => Some(*f),
        _ => None,
    }
}

/// Round half away from zero to 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Decimal text of a number, with negative zero written as `0`
pub fn render_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(value: Value) -> StreamEvent {
        match value {
            Value::Object(map) => StreamEvent::new(4, map),
            _ => panic!("test payload must be an object"),
        }
    }

    fn transformer(category: TripCategory) -> RecordTransformer {
        RecordTransformer::new(category, LookupTables::defaults())
            .unwrap()
            .with_ingestion_date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
    }

    #[test]
    fn test_fhv_transform() {
        let record = transformer(TripCategory::Fhv)
            .transform_with_id(
                &event(json!({
                    "dispatching_base_num": "B00013",
                    "pickup_datetime": "2023-01-01 00:01:00",
                    "dropOff_datetime": "2023-01-01 00:31:30",
                    "PUlocationID": "0",
                    "DOlocationID": "0",
                    "SR_Flag": "0",
                    "Affiliated_base_number": "B00013"
                })),
                7,
            )
            .unwrap();

        assert_eq!(
            record.field_names(),
            vec!["ID", "dispatching_base_num", "date", "SR_Flag", "Trip_Duration", "Ingestion_Date"]
        );
        assert_eq!(record.get("ID"), Some(&AttributeValue::n(7u64)));
        assert_eq!(record.get("date"), Some(&AttributeValue::s("2023-01-01")));
        assert_eq!(record.get("SR_Flag"), Some(&AttributeValue::s("Non-Shared")));
        assert_eq!(record.get("Trip_Duration"), Some(&AttributeValue::n("30.5")));
        assert_eq!(record.get("Ingestion_Date"), Some(&AttributeValue::s("09/03/2024")));
    }

    #[test]
    fn test_negative_duration_is_kept() {
        let record = transformer(TripCategory::Fhv)
            .transform_with_id(
                &event(json!({
                    "pickup_datetime": "2023-01-01 00:10:00",
                    "dropOff_datetime": "2023-01-01 00:00:20",
                    "SR_Flag": 1
                })),
                1,
            )
            .unwrap();
        assert_eq!(record.get("Trip_Duration"), Some(&AttributeValue::n("-9.67")));
        assert_eq!(record.get("dispatching_base_num"), Some(&AttributeValue::s("")));
    }

    #[test]
    fn test_missing_code_renders_empty() {
        let pending = transformer(TripCategory::Yellow)
            .transform(&event(json!({
                "tpep_pickup_datetime": "2023-01-01 00:00:00",
                "tpep_dropoff_datetime": "2023-01-01 00:05:00",
                "RatecodeID": null,
                "payment_type": 9
            })))
            .unwrap();
        let record = pending.with_id(1);

        assert_eq!(record.get("RateCode"), Some(&AttributeValue::s("")));
        assert_eq!(record.get("Payment"), Some(&AttributeValue::s("Undefined")));
        assert_eq!(record.get("airport_fee"), Some(&AttributeValue::s("")));
    }

    #[test]
    fn test_unmatched_trip_type_is_malformed() {
        let err = transformer(TripCategory::Green)
            .transform(&event(json!({
                "lpep_pickup_datetime": "2023-01-01 00:00:00",
                "lpep_dropoff_datetime": "2023-01-01 00:05:00",
                "trip_type": 5
            })))
            .unwrap_err();
        assert!(matches!(err, TripstreamError::MalformedRecord(_)));
        assert!(err.to_string().contains("type_of_trip"));
    }

    #[test]
    fn test_hvfhv_total_excludes_driver_pay() {
        let record = transformer(TripCategory::Hvfhv)
            .transform_with_id(
                &event(json!({
                    "hvfhs_license_num": "HV0005",
                    "dispatching_base_num": "B03406",
                    "pickup_datetime": "2023-01-01 00:00:00",
                    "dropoff_datetime": "2023-01-01 00:12:00",
                    "trip_miles": 2.1,
                    "trip_time": 720,
                    "base_passenger_fare": 10.1,
                    "tolls": 0.0,
                    "bcf": 0.3,
                    "sales_tax": 0.9,
                    "congestion_surcharge": 2.75,
                    "airport_fee": 0.0,
                    "tips": 1.0,
                    "driver_pay": 8.0,
                    "shared_match_flag": "N"
                })),
                3,
            )
            .unwrap();

        assert_eq!(record.get("hvfhs_license_num"), Some(&AttributeValue::s("Lyft")));
        assert_eq!(record.get("trip_total_amount"), Some(&AttributeValue::n("15.05")));
        assert_eq!(record.get("shared_match_flag"), Some(&AttributeValue::s("Not shared")));
        assert_eq!(record.fields.len(), 11);
    }

    #[test]
    fn test_hvfhv_total_missing_component() {
        let record = transformer(TripCategory::Hvfhv)
            .transform_with_id(
                &event(json!({
                    "pickup_datetime": "2023-01-01 00:00:00",
                    "dropoff_datetime": "2023-01-01 00:12:00",
                    "base_passenger_fare": 10.1
                })),
                3,
            )
            .unwrap();
        assert_eq!(record.get("trip_total_amount"), Some(&AttributeValue::s("")));
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(-0.0), "0");
        assert_eq!(render_number(round2(2.345_000_1)), "2.35");
        assert_eq!(render_number(1.0), "1");
    }
}
