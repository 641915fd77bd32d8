//! Inbound sensor payload decoding.

use serde_json::Value;
use thiserror::Error;

/// One decoded temperature/humidity pair, before the pipeline stamps it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub temperature: f64,
    pub humidity: f64,
}

/// A payload that cannot become a sample. Dropped and logged by the
/// stream; never fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload carries neither temperature nor humidity")]
    NoFields,

    #[error("field {field} is not a number")]
    NonNumeric { field: &'static str },
}

/// Decode one inbound sensor payload.
///
/// A field that is absent while the other is present defaults to 0.0. A
/// payload with neither field carries no measurement at all and is
/// rejected, as is a present-but-non-numeric value. Unrecognized fields
/// are ignored.
pub fn decode_payload(payload: &[u8]) -> Result<SensorSample, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    if !fields.contains_key("temperature") && !fields.contains_key("humidity") {
        return Err(DecodeError::NoFields);
    }

    Ok(SensorSample {
        temperature: numeric_field(&fields, "temperature")?,
        humidity: numeric_field(&fields, "humidity")?,
    })
}

fn numeric_field(
    fields: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<f64, DecodeError> {
    match fields.get(field) {
        None => Ok(0.0),
        Some(value) => value.as_f64().ok_or(DecodeError::NonNumeric { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_payload() {
        let sample = decode_payload(br#"{"temperature": 21.5, "humidity": 48}"#).unwrap();
        assert_eq!(
            sample,
            SensorSample {
                temperature: 21.5,
                humidity: 48.0
            }
        );
    }

    #[test]
    fn missing_humidity_defaults_to_zero() {
        let sample = decode_payload(br#"{"temperature": 21.5}"#).unwrap();
        assert_eq!(sample.temperature, 21.5);
        assert_eq!(sample.humidity, 0.0);
    }

    #[test]
    fn missing_temperature_defaults_to_zero() {
        let sample = decode_payload(br#"{"humidity": 48}"#).unwrap();
        assert_eq!(sample.temperature, 0.0);
        assert_eq!(sample.humidity, 48.0);
    }

    #[test]
    fn rejects_non_json_bytes() {
        assert!(matches!(
            decode_payload(b"\xff\xfenot json"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(matches!(
            decode_payload(b"[21.5, 48]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            decode_payload(b"21.5"),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_payload_with_neither_field() {
        assert!(matches!(
            decode_payload(br#"{"pressure": 1013}"#),
            Err(DecodeError::NoFields)
        ));
        assert!(matches!(decode_payload(b"{}"), Err(DecodeError::NoFields)));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(matches!(
            decode_payload(br#"{"temperature": "21.5"}"#),
            Err(DecodeError::NonNumeric {
                field: "temperature"
            })
        ));
        assert!(matches!(
            decode_payload(br#"{"temperature": 21.5, "humidity": null}"#),
            Err(DecodeError::NonNumeric { field: "humidity" })
        ));
    }

    #[test]
    fn ignores_unrecognized_fields() {
        let sample =
            decode_payload(br#"{"temperature": 20.0, "humidity": 50.0, "battery": 87}"#).unwrap();
        assert_eq!(sample.temperature, 20.0);
        assert_eq!(sample.humidity, 50.0);
    }
}
