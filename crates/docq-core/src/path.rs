//! Document and collection paths, and dotted field paths.
//!
//! A path alternates collection names and document ids: `users` is a
//! collection, `users/alice` a document, `users/alice/orders` a
//! subcollection. Odd segment counts denote collections, even counts denote
//! documents.

use std::fmt;

use crate::error::PathError;

/// Whether a path names a collection or a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Collection,
    Document,
}

/// A validated slash-separated path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    raw: String,
}

impl DocPath {
    /// Parse a path, stripping a single trailing slash.
    ///
    /// Fails if the path is empty or any segment is empty (`users//alice`,
    /// `/users`).
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let trimmed = input.strip_suffix('/').unwrap_or(input);
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(PathError::EmptySegment(input.to_string()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
        })
    }

    /// Parse a path that must name a collection.
    pub fn collection(input: &str) -> Result<Self, PathError> {
        let path = Self::parse(input)?;
        if !path.is_collection() {
            return Err(PathError::NotACollection(path.raw));
        }
        Ok(path)
    }

    /// Parse a path that must name a document.
    pub fn document(input: &str) -> Result<Self, PathError> {
        let path = Self::parse(input)?;
        if !path.is_document() {
            return Err(PathError::NotADocument(path.raw));
        }
        Ok(path)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PathKind {
        if self.raw.split('/').count() % 2 == 1 {
            PathKind::Collection
        } else {
            PathKind::Document
        }
    }

    pub fn is_collection(&self) -> bool {
        self.kind() == PathKind::Collection
    }

    pub fn is_document(&self) -> bool {
        self.kind() == PathKind::Document
    }

    /// The last segment: a document id or a collection name.
    pub fn id(&self) -> &str {
        self.raw.rsplit('/').next().unwrap_or(&self.raw)
    }

    /// The enclosing path, or `None` for a root collection.
    pub fn parent(&self) -> Option<DocPath> {
        self.raw.rsplit_once('/').map(|(parent, _)| DocPath {
            raw: parent.to_string(),
        })
    }

    /// Append a segment. The caller guarantees the segment is non-empty and
    /// contains no slash.
    pub fn child(&self, segment: &str) -> DocPath {
        DocPath {
            raw: format!("{}/{}", self.raw, segment),
        }
    }

    /// The rest of `key` below this path, or `None` unless `key` lies
    /// strictly below it.
    pub fn relative<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.raw.as_str())?
            .strip_prefix('/')
            .filter(|rest| !rest.is_empty())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a dotted field path (`address.city`) into its segments.
pub fn field_segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}
