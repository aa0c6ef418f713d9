//! Stream delivery envelope
//!
//! A consumer invocation receives a batch shaped like
//! `{"Records":[{"kinesis":{"partitionKey":"1","data":"<base64 JSON>"}}]}`.

use crate::domain::{Result, StreamEvent, TripstreamError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One micro-batch delivered to a consumer invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<DeliveryRecord>,
}

/// A single delivered message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub kinesis: StreamPayload,
}

/// Transport fields of a delivered message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(rename = "partitionKey", default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,

    #[serde(rename = "sequenceNumber", default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,

    /// Base64-encoded message body
    pub data: String,
}

impl DeliveryBatch {
    /// Build a batch from raw message bodies
    pub fn from_messages(partition_key: &str, messages: &[Vec<u8>]) -> Self {
        let records = messages
            .iter()
            .enumerate()
            .map(|(index, message)| DeliveryRecord {
                kinesis: StreamPayload {
                    partition_key: Some(partition_key.to_string()),
                    sequence_number: Some(index.to_string()),
                    data: STANDARD.encode(message),
                },
            })
            .collect();
        Self { records }
    }

    /// Parse a batch from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TripstreamError::MalformedRecord(format!("invalid delivery batch: {e}")))
    }

    /// Read a batch from a JSON file
    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TripstreamError::Io(format!("Failed to read delivery batch {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode one record into a stream event
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if the payload is not base64, not UTF-8, not
    /// JSON, or not a JSON object.
    pub fn decode(&self, index: usize) -> Result<StreamEvent> {
        let record = self.records.get(index).ok_or_else(|| {
            TripstreamError::MalformedRecord(format!("no record at position {index}"))
        })?;
        decode_payload(index, &record.kinesis.data)
    }
}

/// Decode a base64 message body into a stream event
pub fn decode_payload(sequence: usize, data: &str) -> Result<StreamEvent> {
    let bytes = STANDARD.decode(data.trim())?;
    let text = String::from_utf8(bytes).map_err(|e| {
        TripstreamError::MalformedRecord(format!("record {sequence}: payload is not UTF-8: {e}"))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        TripstreamError::MalformedRecord(format!("record {sequence}: payload is not JSON: {e}"))
    })?;

    match value {
        Value::Object(payload) => Ok(StreamEvent::new(sequence, payload)),
        other => Err(TripstreamError::MalformedRecord(format!(
            "record {sequence}: expected a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_roundtrip_through_json() {
        let body = serde_json::to_vec(&json!({"VendorID": "2"})).unwrap();
        let batch = DeliveryBatch::from_messages("1", &[body]);
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.starts_with("{\"Records\":[{\"kinesis\""));

        let parsed = DeliveryBatch::from_json(&json).unwrap();
        let event = parsed.decode(0).unwrap();
        assert_eq!(event.sequence, 0);
        assert_eq!(event.payload["VendorID"], json!("2"));
    }

    #[test]
    fn test_decode_minimal_envelope() {
        let json = r#"{"Records":[{"kinesis":{"data":"eyJhIjogMX0="}}]}"#;
        let batch = DeliveryBatch::from_json(json).unwrap();
        assert_eq!(batch.decode(0).unwrap().payload["a"], json!(1));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_payload(0, "***").unwrap_err();
        assert!(matches!(err, TripstreamError::MalformedRecord(_)));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let data = STANDARD.encode("[1,2]");
        assert!(decode_payload(3, &data)
            .unwrap_err()
            .to_string()
            .contains("record 3"));
    }

    #[test]
    fn test_decode_out_of_range() {
        assert!(DeliveryBatch::default().decode(0).is_err());
    }
}
