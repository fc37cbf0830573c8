//! Before/after snapshots of mutated documents.
//!
//! When a mutating command is listed in `backup.commands`, a document
//! `{created_at, path, before, after}` is created in the backup collection
//! under the current unix time in milliseconds. Backup failures are logged
//! and never fail the command itself.

use chrono::{DateTime, Utc};
use docq_core::path::DocPath;
use docq_core::store::Store;
use docq_core::types::{Document, FieldValue, WriteFields};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BackupConfig;
use crate::error::ConsoleError;

/// The current body of `path`, if it is an existing document.
pub fn snapshot(store: &dyn Store, path: &DocPath) -> Option<Document> {
    if !path.is_document() {
        return None;
    }
    match store.get(path) {
        Ok(doc) => doc.map(|d| d.data),
        Err(e) => {
            warn!(path = %path, error = %e, "failed to read backup snapshot");
            None
        }
    }
}

pub fn record(
    store: &dyn Store,
    backup: &BackupConfig,
    path: &DocPath,
    before: Option<Document>,
    after: Option<Document>,
) {
    match write(store, backup, path, before, after, Utc::now()) {
        Ok(target) => debug!(path = %path, backup = %target, "backup recorded"),
        Err(e) => warn!(path = %path, error = %e, "failed to create backup"),
    }
}

fn write(
    store: &dyn Store,
    backup: &BackupConfig,
    path: &DocPath,
    before: Option<Document>,
    after: Option<Document>,
    now: DateTime<Utc>,
) -> Result<DocPath, ConsoleError> {
    let target =
        DocPath::collection(backup.collection())?.child(&now.timestamp_millis().to_string());

    let mut fields = WriteFields::new();
    fields.insert("created_at".to_string(), FieldValue::Timestamp(now));
    fields.insert(
        "path".to_string(),
        FieldValue::Json(Value::String(path.to_string())),
    );
    fields.insert(
        "before".to_string(),
        FieldValue::Json(before.map_or(Value::Null, Value::Object)),
    );
    fields.insert(
        "after".to_string(),
        FieldValue::Json(after.map_or(Value::Null, Value::Object)),
    );

    Ok(store.create(&target, fields)?)
}
