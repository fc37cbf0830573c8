//! Core types: documents, stored documents with metadata, write payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::DocPath;

/// A document body: field name to JSON value.
pub type Document = Map<String, Value>;

/// A document body together with the metadata the store knows about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub path: String,
    pub data: Document,
}

impl StoredDocument {
    pub fn new(path: &DocPath, data: Document) -> Self {
        Self {
            id: path.id().to_string(),
            path: path.as_str().to_string(),
            data,
        }
    }
}

/// A value in a write payload after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Render as JSON. Timestamps become fixed-width RFC 3339 UTC strings so
    /// that string order matches chronological order.
    pub fn into_json(self) -> Value {
        match self {
            FieldValue::Json(value) => value,
            FieldValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
        }
    }
}

/// A coerced write payload, keyed by field name (or dotted field path for
/// updates).
pub type WriteFields = BTreeMap<String, FieldValue>;

/// Render a write payload as a document body.
pub fn fields_to_document(fields: WriteFields) -> Document {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.into_json()))
        .collect()
}
