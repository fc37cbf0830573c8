//! # docq
//!
//! Query engine for a hierarchical document database (collections of JSON
//! documents, each of which may own subcollections).
//!
//! The crate compiles the JSON filter language into a typed expression tree,
//! parses ordering clauses, coerces write payloads (`$now()` and
//! `$timestamp(...)`), projects fields out of documents and shapes results
//! for output. Reads and writes go through the [`store::Store`] trait;
//! [`store::LocalStore`] is a file-backed implementation.
//!
//! ## Quick Start
//!
//! ```
//! use docq_core::path::DocPath;
//! use docq_core::query::{
//!     DirectionSeparator, ShapeOptions, Selection, coerce_fields, parse_filter,
//!     parse_order_by, project, shape,
//! };
//! use docq_core::store::{LocalStore, Store};
//! use serde_json::json;
//!
//! let store = LocalStore::in_memory();
//! let users = DocPath::collection("users").unwrap();
//!
//! for (id, age) in [("alice", 30), ("bob", 25)] {
//!     let body = json!({ "name": id, "age": age, "joined": "$now()" });
//!     let fields = coerce_fields(body.as_object().unwrap().clone()).unwrap();
//!     store.set(&users.child(id), fields).unwrap();
//! }
//!
//! let selection = Selection::new(users)
//!     .filter(parse_filter(r#"{"age": {">=": 26}}"#).unwrap())
//!     .order_by(parse_order_by("age desc", DirectionSeparator::Space).unwrap())
//!     .fields(vec!["name".to_string()]);
//!
//! let docs = store.query(&selection).unwrap();
//! let projected = docs.iter().map(|d| project(d, &selection.fields)).collect();
//! let shaped = shape(projected, &selection.fields, ShapeOptions { flatten: true, count: false });
//! assert_eq!(shaped.into_json(), json!("alice"));
//! ```

pub mod error;
pub mod path;
pub mod query;
pub mod store;
pub mod types;

pub use error::{Error, Result};
