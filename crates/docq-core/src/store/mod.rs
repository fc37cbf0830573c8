//! The store collaborator: executes selections and writes.
//!
//! The query engine never talks to a database directly. It builds a
//! [`Selection`] and coerced [`WriteFields`], and hands them to a [`Store`].

pub mod local;

pub use local::LocalStore;

use crate::error::StoreError;
use crate::path::DocPath;
use crate::query::Selection;
use crate::types::{StoredDocument, WriteFields};

/// Operations a hierarchical document store must provide.
///
/// Calls are blocking from the caller's point of view.
pub trait Store {
    /// Fetch one document. `Ok(None)` if it does not exist.
    fn get(&self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError>;

    /// Run a selection against a collection. Returned documents carry their
    /// full bodies; projection is applied by the caller.
    fn query(&self, selection: &Selection) -> Result<Vec<StoredDocument>, StoreError>;

    /// Collection names at the root (`None`) or under a document.
    fn collections(&self, parent: Option<&DocPath>) -> Result<Vec<String>, StoreError>;

    /// Number of documents directly in a collection.
    fn count(&self, collection: &DocPath) -> Result<usize, StoreError>;

    /// Create a document. A collection path gets a generated id. Fails if the
    /// document already exists. Returns the path of the new document.
    fn create(&self, path: &DocPath, fields: WriteFields) -> Result<DocPath, StoreError>;

    /// Create or replace a document.
    fn set(&self, path: &DocPath, fields: WriteFields) -> Result<(), StoreError>;

    /// Merge fields into an existing document. Keys are dotted field paths.
    fn update(&self, path: &DocPath, fields: WriteFields) -> Result<(), StoreError>;

    /// Delete a document or a whole collection, including subcollections.
    fn delete(&self, path: &DocPath) -> Result<(), StoreError>;

    /// Remove one (possibly nested) field from a document.
    fn delete_field(&self, path: &DocPath, field: &str) -> Result<(), StoreError>;
}
