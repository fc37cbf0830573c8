//! Projection: return only selected fields from documents.
//!
//! Projection is applied after the store returns full documents. Selected
//! fields are keyed by the field path exactly as requested, so
//! `address.city` projects to `{"address.city": "NYC"}`. Two reserved names
//! are synthesized from document metadata instead of being read from the
//! body.

use serde_json::Value;
use tracing::debug;

use crate::error::ProjectionMiss;
use crate::path::field_segments;
use crate::types::{Document, StoredDocument};

/// Selects the document id.
pub const DOCUMENT_ID_FIELD: &str = "$id";

/// Selects the full document path.
pub const DOCUMENT_PATH_FIELD: &str = "$path";

/// Resolve a dot-separated field path within a document body.
///
/// Returns `None` if any segment is missing or an intermediate value is not
/// an object.
pub fn resolve_field<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = field_segments(path).into_iter();
    let mut value = doc.get(segments.next()?)?;
    for segment in segments {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}

/// Resolve one selected field, including the reserved metadata fields.
pub fn resolve_selected(doc: &StoredDocument, field: &str) -> Result<Value, ProjectionMiss> {
    match field {
        DOCUMENT_ID_FIELD => Ok(Value::String(doc.id.clone())),
        DOCUMENT_PATH_FIELD => Ok(Value::String(doc.path.clone())),
        _ => resolve_field(&doc.data, field)
            .cloned()
            .ok_or_else(|| ProjectionMiss {
                field: field.to_string(),
            }),
    }
}

/// Apply a projection to a stored document. If `fields` is empty, returns
/// the full body. Fields that do not resolve are omitted.
pub fn project(doc: &StoredDocument, fields: &[String]) -> Document {
    if fields.is_empty() {
        return doc.data.clone();
    }

    let mut result = Document::new();
    for field in fields {
        match resolve_selected(doc, field) {
            Ok(value) => {
                result.insert(field.clone(), value);
            }
            Err(miss) => debug!(path = %doc.path, %miss, "projection miss"),
        }
    }
    result
}
