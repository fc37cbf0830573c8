//! In-process hierarchical document store, optionally persisted to a JSON
//! file.
//!
//! Documents are kept in a `BTreeMap` keyed by full document path, so every
//! document under a given path prefix is a contiguous key range. Collections
//! are implicit: a collection exists while at least one document lives in it
//! or below it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::Store;
use crate::error::StoreError;
use crate::path::{DocPath, field_segments};
use crate::query::filter::compare_values;
use crate::query::{Direction, OrderBy, Selection, resolve_field};
use crate::types::{Document, StoredDocument, WriteFields, fields_to_document};

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    documents: BTreeMap<String, Document>,
}

struct StoreInner {
    state: RwLock<Snapshot>,
    file: Option<PathBuf>,
}

/// A local document store.
///
/// `LocalStore` is cheaply clonable (`Arc`-based) and `Send + Sync`. When
/// backed by a file, every mutation rewrites the file through a temporary
/// sibling and an atomic rename.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<StoreInner>,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::with_snapshot(Snapshot::default(), None)
    }

    /// Open the store file at `path`, starting empty if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let snapshot = if path.exists() {
            let bytes = std::fs::read(path)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                Snapshot::default()
            } else {
                serde_json::from_slice(&bytes)?
            }
        } else {
            Snapshot::default()
        };
        debug!(
            file = %path.display(),
            documents = snapshot.documents.len(),
            "opened local store"
        );
        Ok(Self::with_snapshot(snapshot, Some(path.to_path_buf())))
    }

    fn with_snapshot(snapshot: Snapshot, file: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(snapshot),
                file,
            }),
        }
    }

    /// Apply a mutation under the write lock and persist the result.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.inner.state.write();
        let out = f(&mut state)?;
        self.persist(&state)?;
        Ok(out)
    }

    fn persist(&self, state: &Snapshot) -> Result<(), StoreError> {
        let Some(path) = &self.inner.file else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Store for LocalStore {
    fn get(&self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError> {
        require_document(path)?;
        let state = self.inner.state.read();
        Ok(state
            .documents
            .get(path.as_str())
            .map(|data| StoredDocument::new(path, data.clone())))
    }

    fn query(&self, selection: &Selection) -> Result<Vec<StoredDocument>, StoreError> {
        let collection = &selection.path;
        require_collection(collection)?;

        let mut matched: Vec<StoredDocument> = {
            let state = self.inner.state.read();
            children(&state.documents, collection)
                .filter(|(_, data)| selection.filter.as_ref().is_none_or(|f| f.matches(data)))
                .map(|(key, data)| stored(key, data))
                .collect()
        };

        // Documents without every ordering field are not part of an ordered
        // result.
        if !selection.order_by.is_empty() {
            matched.retain(|doc| {
                selection
                    .order_by
                    .iter()
                    .all(|o| resolve_field(&doc.data, &o.field).is_some())
            });
            matched.sort_by(|a, b| compare_documents(a, b, &selection.order_by));
        }

        let rows = matched.into_iter().skip(selection.offset);
        let rows: Vec<StoredDocument> = if selection.limit > 0 {
            rows.take(selection.limit).collect()
        } else {
            rows.collect()
        };

        debug!(collection = %collection, returned = rows.len(), "query executed");
        Ok(rows)
    }

    fn collections(&self, parent: Option<&DocPath>) -> Result<Vec<String>, StoreError> {
        let state = self.inner.state.read();
        let names: BTreeSet<&str> = match parent {
            None => state
                .documents
                .keys()
                .filter_map(|key| key.split('/').next())
                .collect(),
            Some(doc) => {
                require_document(doc)?;
                descendants(&state.documents, doc)
                    .filter_map(|(key, _)| doc.relative(key)?.split('/').next())
                    .collect()
            }
        };
        Ok(names.into_iter().map(str::to_string).collect())
    }

    fn count(&self, collection: &DocPath) -> Result<usize, StoreError> {
        require_collection(collection)?;
        let state = self.inner.state.read();
        Ok(children(&state.documents, collection).count())
    }

    fn create(&self, path: &DocPath, fields: WriteFields) -> Result<DocPath, StoreError> {
        let target = if path.is_collection() {
            path.child(&Uuid::new_v4().simple().to_string())
        } else {
            path.clone()
        };
        let data = fields_to_document(fields);

        self.mutate(|state| {
            if state.documents.contains_key(target.as_str()) {
                return Err(StoreError::AlreadyExists(target.to_string()));
            }
            state.documents.insert(target.to_string(), data);
            Ok(())
        })?;

        info!(path = %target, "document created");
        Ok(target)
    }

    fn set(&self, path: &DocPath, fields: WriteFields) -> Result<(), StoreError> {
        require_document(path)?;
        let data = fields_to_document(fields);
        self.mutate(|state| {
            state.documents.insert(path.to_string(), data);
            Ok(())
        })?;
        info!(path = %path, "document set");
        Ok(())
    }

    fn update(&self, path: &DocPath, fields: WriteFields) -> Result<(), StoreError> {
        require_document(path)?;
        if fields.is_empty() {
            return Err(StoreError::EmptyUpdate(path.to_string()));
        }

        self.mutate(|state| {
            let doc = state
                .documents
                .get_mut(path.as_str())
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            for (field, value) in fields {
                set_path(doc, &field_segments(&field), value.into_json());
            }
            Ok(())
        })?;

        info!(path = %path, "document updated");
        Ok(())
    }

    fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let removed = self.mutate(|state| {
            let mut keys: Vec<String> = descendants(&state.documents, path)
                .map(|(key, _)| key.clone())
                .collect();
            if path.is_document() && state.documents.contains_key(path.as_str()) {
                keys.push(path.to_string());
            }
            if path.is_collection() && keys.is_empty() {
                return Err(StoreError::NotFound(path.to_string()));
            }
            for key in &keys {
                state.documents.remove(key);
            }
            Ok(keys.len())
        })?;

        info!(path = %path, removed, "deleted");
        Ok(())
    }

    fn delete_field(&self, path: &DocPath, field: &str) -> Result<(), StoreError> {
        require_document(path)?;
        self.mutate(|state| {
            let doc = state
                .documents
                .get_mut(path.as_str())
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            remove_path(doc, &field_segments(field));
            Ok(())
        })?;
        info!(path = %path, field, "field deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_document(path: &DocPath) -> Result<(), StoreError> {
    if path.is_document() {
        Ok(())
    } else {
        Err(StoreError::InvalidOperation(format!(
            "'{path}' is a collection path, expected a document"
        )))
    }
}

fn require_collection(path: &DocPath) -> Result<(), StoreError> {
    if path.is_collection() {
        Ok(())
    } else {
        Err(StoreError::InvalidOperation(format!(
            "'{path}' is a document path, expected a collection"
        )))
    }
}

fn stored(key: &str, data: &Document) -> StoredDocument {
    StoredDocument {
        id: key.rsplit('/').next().unwrap_or(key).to_string(),
        path: key.to_string(),
        data: data.clone(),
    }
}

/// Every document strictly below `ancestor`, in key order.
fn descendants<'a>(
    documents: &'a BTreeMap<String, Document>,
    ancestor: &'a DocPath,
) -> impl Iterator<Item = (&'a String, &'a Document)> {
    documents
        .range(format!("{ancestor}/")..)
        .take_while(move |(key, _)| ancestor.relative(key).is_some())
}

/// Documents directly inside `collection`.
fn children<'a>(
    documents: &'a BTreeMap<String, Document>,
    collection: &'a DocPath,
) -> impl Iterator<Item = (&'a String, &'a Document)> {
    descendants(documents, collection).filter(move |(key, _)| {
        collection
            .relative(key)
            .is_some_and(|rest| !rest.contains('/'))
    })
}

fn compare_documents(a: &StoredDocument, b: &StoredDocument, order_by: &[OrderBy]) -> Ordering {
    for clause in order_by {
        let ordering = match (
            resolve_field(&a.data, &clause.field),
            resolve_field(&b.data, &clause.field),
        ) {
            (Some(x), Some(y)) => order_values(x, y),
            _ => Ordering::Equal,
        };
        let ordering = match clause.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

/// Total order across JSON types: values of different types order by type
/// (null, boolean, number, string, array, object), values of one type by
/// [`compare_values`].
fn order_values(a: &Value, b: &Value) -> Ordering {
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare_values(a, b).unwrap_or(Ordering::Equal))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Set a value at a dotted path, creating (or replacing non-object)
/// intermediate values with objects.
fn set_path(doc: &mut Document, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            doc.insert(leaf.to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(nested) = entry {
                set_path(nested, rest, value);
            }
        }
    }
}

/// Remove the value at a dotted path. Missing segments are a silent no-op.
fn remove_path(doc: &mut Document, segments: &[&str]) {
    match segments {
        [] => {}
        [leaf] => {
            doc.remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(nested)) = doc.get_mut(*head) {
                remove_path(nested, rest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_filter;
    use crate::types::FieldValue;
    use serde_json::json;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    fn fields(value: Value) -> WriteFields {
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::Json(v.clone())))
            .collect()
    }

    fn seeded() -> LocalStore {
        let store = LocalStore::in_memory();
        store
            .set(&path("users/alice"), fields(json!({"name": "Alice", "age": 30, "city": "NYC"})))
            .unwrap();
        store
            .set(&path("users/bob"), fields(json!({"name": "Bob", "age": 25, "city": "LA"})))
            .unwrap();
        store
            .set(&path("users/carol"), fields(json!({"name": "Carol", "city": "NYC"})))
            .unwrap();
        store
            .set(&path("users/alice/orders/o1"), fields(json!({"item": "shoes", "price": 100})))
            .unwrap();
        store
            .set(&path("products/p1"), fields(json!({"title": "Hat"})))
            .unwrap();
        store
    }

    #[test]
    fn test_get_and_missing() {
        let store = seeded();
        let doc = store.get(&path("users/alice")).unwrap().unwrap();
        assert_eq!(doc.id, "alice");
        assert_eq!(doc.path, "users/alice");
        assert_eq!(doc.data["name"], "Alice");
        assert!(store.get(&path("users/zed")).unwrap().is_none());
    }

    #[test]
    fn test_get_collection_path_rejected() {
        let store = seeded();
        assert!(matches!(
            store.get(&path("users")),
            Err(StoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_query_direct_children_only() {
        let store = seeded();
        let rows = store.query(&Selection::new(path("users"))).unwrap();
        let ids: Vec<&str> = rows.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_query_with_filter() {
        let store = seeded();
        let sel = Selection::new(path("users")).filter(parse_filter(r#"{"city": "NYC"}"#).unwrap());
        let rows = store.query(&sel).unwrap();
        let ids: Vec<&str> = rows.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "carol"]);

        let sel = Selection::new(path("users"))
            .filter(parse_filter(r#"{"$or": {"age": {">": 26}, "name": "Bob"}}"#).unwrap());
        assert_eq!(store.query(&sel).unwrap().len(), 2);
    }

    #[test]
    fn test_query_order_excludes_missing_field() {
        let store = seeded();
        let sel = Selection::new(path("users")).order_by(vec![OrderBy::desc("age")]);
        let rows = store.query(&sel).unwrap();
        let ids: Vec<&str> = rows.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[test]
    fn test_query_multi_key_order() {
        let store = seeded();
        let sel = Selection::new(path("users"))
            .order_by(vec![OrderBy::asc("city"), OrderBy::desc("name")]);
        let rows = store.query(&sel).unwrap();
        let ids: Vec<&str> = rows.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["bob", "carol", "alice"]);
    }

    #[test]
    fn test_query_limit_offset() {
        let store = seeded();
        let sel = Selection::new(path("users")).offset(1).limit(1);
        let rows = store.query(&sel).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "bob");

        let sel = Selection::new(path("users")).offset(5);
        assert!(store.query(&sel).unwrap().is_empty());
    }

    #[test]
    fn test_query_subcollection() {
        let store = seeded();
        let rows = store
            .query(&Selection::new(path("users/alice/orders")))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, "users/alice/orders/o1");
    }

    #[test]
    fn test_collections() {
        let store = seeded();
        assert_eq!(store.collections(None).unwrap(), vec!["products", "users"]);
        assert_eq!(
            store.collections(Some(&path("users/alice"))).unwrap(),
            vec!["orders"]
        );
        assert!(store
            .collections(Some(&path("users/bob")))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_count() {
        let store = seeded();
        assert_eq!(store.count(&path("users")).unwrap(), 3);
        assert_eq!(store.count(&path("nothing")).unwrap(), 0);
    }

    #[test]
    fn test_create_with_generated_id() {
        let store = LocalStore::in_memory();
        let created = store
            .create(&path("users"), fields(json!({"name": "Dan"})))
            .unwrap();
        assert!(created.is_document());
        assert_eq!(created.parent().unwrap().as_str(), "users");
        assert!(store.get(&created).unwrap().is_some());
    }

    #[test]
    fn test_create_existing_fails() {
        let store = seeded();
        let err = store
            .create(&path("users/alice"), fields(json!({"name": "Again"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn test_set_replaces_document() {
        let store = seeded();
        store
            .set(&path("users/alice"), fields(json!({"name": "Alicia"})))
            .unwrap();
        let doc = store.get(&path("users/alice")).unwrap().unwrap();
        assert_eq!(Value::Object(doc.data), json!({"name": "Alicia"}));
    }

    #[test]
    fn test_update_merges_dotted_paths() {
        let store = seeded();
        store
            .update(
                &path("users/alice"),
                fields(json!({"age": 31, "address.city": "Boston"})),
            )
            .unwrap();
        let doc = store.get(&path("users/alice")).unwrap().unwrap();
        assert_eq!(doc.data["age"], 31);
        assert_eq!(doc.data["name"], "Alice");
        assert_eq!(doc.data["address"], json!({"city": "Boston"}));
    }

    #[test]
    fn test_update_missing_and_empty() {
        let store = seeded();
        assert!(matches!(
            store.update(&path("users/zed"), fields(json!({"a": 1}))),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update(&path("users/alice"), WriteFields::new()),
            Err(StoreError::EmptyUpdate(_))
        ));
    }

    #[test]
    fn test_delete_document_removes_subcollections() {
        let store = seeded();
        store.delete(&path("users/alice")).unwrap();
        assert!(store.get(&path("users/alice")).unwrap().is_none());
        assert!(store.get(&path("users/alice/orders/o1")).unwrap().is_none());
        assert_eq!(store.count(&path("users")).unwrap(), 2);
    }

    #[test]
    fn test_delete_collection() {
        let store = seeded();
        store.delete(&path("users")).unwrap();
        assert_eq!(store.collections(None).unwrap(), vec!["products"]);
        assert!(matches!(
            store.delete(&path("users")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_field_nested() {
        let store = LocalStore::in_memory();
        store
            .set(
                &path("users/alice"),
                fields(json!({"name": "Alice", "address": {"city": "NYC", "zip": "10001"}})),
            )
            .unwrap();
        store.delete_field(&path("users/alice"), "address.zip").unwrap();
        store.delete_field(&path("users/alice"), "missing.path").unwrap();
        let doc = store.get(&path("users/alice")).unwrap().unwrap();
        assert_eq!(
            Value::Object(doc.data),
            json!({"name": "Alice", "address": {"city": "NYC"}})
        );
    }

    #[test]
    fn test_timestamps_stored_as_strings() {
        let store = LocalStore::in_memory();
        let mut payload = WriteFields::new();
        payload.insert(
            "created".to_string(),
            FieldValue::Timestamp(
                chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&chrono::Utc),
            ),
        );
        store.set(&path("events/e1"), payload).unwrap();
        let doc = store.get(&path("events/e1")).unwrap().unwrap();
        assert_eq!(doc.data["created"], "2024-01-01T00:00:00.000000000Z");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("store.json");
        {
            let store = LocalStore::open(&file).unwrap();
            store
                .set(&path("users/alice"), fields(json!({"name": "Alice"})))
                .unwrap();
        }
        let reopened = LocalStore::open(&file).unwrap();
        let doc = reopened.get(&path("users/alice")).unwrap().unwrap();
        assert_eq!(doc.data["name"], "Alice");
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");
        std::fs::write(&file, "{not json").unwrap();
        assert!(matches!(
            LocalStore::open(&file),
            Err(StoreError::Serialization(_))
        ));
    }
}
