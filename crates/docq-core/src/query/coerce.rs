//! Write-payload coercion of function tokens.
//!
//! Top-level string fields of a create/set/update payload may hold:
//!
//! - `$now()` (any ASCII case): replaced by the current instant
//! - `$timestamp(<RFC 3339>)`: replaced by the parsed instant
//!
//! The pass is shallow; strings inside nested objects or arrays are stored
//! verbatim.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::CoercionError;
use crate::types::{Document, FieldValue, WriteFields};

pub const NOW_TOKEN: &str = "$now()";
pub const TIMESTAMP_PREFIX: &str = "$timestamp(";

/// Coerce a payload using the current wall-clock time for `$now()`.
pub fn coerce_fields(doc: Document) -> Result<WriteFields, CoercionError> {
    coerce_fields_at(doc, Utc::now())
}

/// Coerce a payload, substituting `now` for every `$now()` token.
pub fn coerce_fields_at(doc: Document, now: DateTime<Utc>) -> Result<WriteFields, CoercionError> {
    doc.into_iter()
        .map(|(field, value)| {
            let coerced = coerce_value(&field, value, now)?;
            Ok((field, coerced))
        })
        .collect()
}

fn coerce_value(field: &str, value: Value, now: DateTime<Utc>) -> Result<FieldValue, CoercionError> {
    let Value::String(s) = value else {
        return Ok(FieldValue::Json(value));
    };

    if s.eq_ignore_ascii_case(NOW_TOKEN) {
        return Ok(FieldValue::Timestamp(now));
    }

    if let Some(arg) = s
        .strip_prefix(TIMESTAMP_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return DateTime::parse_from_rfc3339(arg.trim())
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|e| CoercionError::InvalidTimestamp {
                field: field.to_string(),
                raw: s.clone(),
                reason: e.to_string(),
            });
    }

    Ok(FieldValue::Json(Value::String(s)))
}
