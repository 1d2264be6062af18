use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::entities::{FieldValue, RecordFields, RecordId, CREATED_AT_FIELD};

// Conversion functions between client JSON payloads and record models

/// Client key carrying epoch milliseconds
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Keys reserved for the store-assigned identifier
pub const IDENTIFIER_FIELDS: [&str; 2] = ["id", "_id"];

/// A client payload split into its temporal keys and plain fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPayload {
    /// Raw `timestamp` value, if supplied
    pub timestamp: Option<Value>,

    /// Raw `createdAt` value, if supplied
    pub created_at: Option<Value>,

    /// Remaining fields, already converted
    pub fields: RecordFields,
}

/// Current UTC time at the millisecond precision the document store keeps
pub fn current_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Field names the document store would read as paths or operators
fn is_reserved_field_name(name: &str) -> bool {
    name.is_empty() || name.starts_with('$') || name.contains('.')
}

/// Helper function to parse a client-supplied identifier
///
/// Identifiers are 24-character hex ObjectIds; anything else is rejected.
pub fn parse_record_id(id: &str) -> Result<RecordId, String> {
    RecordId::parse_str(id).map_err(|_| format!("Invalid ObjectId: {}", id))
}

/// Convert an epoch-milliseconds JSON number to a UTC date-time
pub fn epoch_millis_to_datetime(value: &Value) -> Result<DateTime<Utc>, String> {
    let number = match value {
        Value::Number(number) => number,
        _ => return Err(format!("'{}' must be milliseconds since the epoch", TIMESTAMP_FIELD)),
    };

    let millis = match number.as_i64() {
        Some(millis) => Some(millis),
        None => number
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.round() as i64),
    };

    millis
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
        .ok_or_else(|| format!("'{}' is out of range: {}", TIMESTAMP_FIELD, number))
}

/// Parse a client `createdAt` string (RFC 3339) to a UTC date-time
pub fn parse_created_at(value: &Value) -> Result<DateTime<Utc>, String> {
    value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("'{}' must be an RFC 3339 date-time string", CREATED_AT_FIELD))
}

/// Convert a single JSON value into a stored field value
pub fn convert_to_field_value(name: &str, value: Value) -> Result<FieldValue, String> {
    match value {
        Value::String(text) => Ok(FieldValue::Text(text)),
        Value::Number(number) => Ok(FieldValue::Number(number)),
        _ => Err(format!(
            "Unsupported value for field '{}': expected a string or a number",
            name
        )),
    }
}

/// Split a JSON object into temporal keys and converted fields.
///
/// Identifier keys and names with `$` or `.` are refused. A null
/// `timestamp` or `createdAt` counts as absent.
pub fn split_payload(object: Map<String, Value>) -> Result<RecordPayload, String> {
    let mut payload = RecordPayload::default();

    for (name, value) in object {
        if IDENTIFIER_FIELDS.contains(&name.as_str()) {
            return Err(format!("Field '{}' is assigned by the server", name));
        }
        if is_reserved_field_name(&name) {
            return Err(format!(
                "Invalid field name '{}': names must be non-empty, not start with '$' and not contain '.'",
                name
            ));
        }

        if name == TIMESTAMP_FIELD {
            payload.timestamp = Some(value).filter(|v| !v.is_null());
        } else if name == CREATED_AT_FIELD {
            payload.created_at = Some(value).filter(|v| !v.is_null());
        } else {
            let converted = convert_to_field_value(&name, value)?;
            payload.fields.insert(name, converted);
        }
    }

    Ok(payload)
}
