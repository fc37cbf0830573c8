//! Error types for all docq operations.

use std::io;
use thiserror::Error;

/// Top-level error type for docq operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    OrderBy(#[from] OrderByError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("'{0}' is not a collection path")]
    NotACollection(String),

    #[error("'{0}' is not a document path")]
    NotADocument(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid query format, {0}; see help for more information on query syntax")]
    Malformed(String),

    #[error("unknown field operator '{operator}' for field '{field}'")]
    UnknownOperator { operator: String, field: String },

    #[error("filter nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderByError {
    #[error("invalid order-by clause '{clause}': {reason}")]
    Malformed { clause: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("invalid timestamp for field '{field}': '{raw}' ({reason})")]
    InvalidTimestamp {
        field: String,
        raw: String,
        reason: String,
    },
}

/// A selected field path did not resolve in a document.
///
/// Non-fatal: the projector drops the field from its output.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("field '{field}' not found")]
pub struct ProjectionMiss {
    pub field: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("document already exists: {0}")]
    AlreadyExists(String),

    #[error("no fields to update for {0}")]
    EmptyUpdate(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
