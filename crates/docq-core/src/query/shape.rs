//! Result shaping: raw documents, flattened values, or a count.

use serde_json::{Value, json};

use crate::types::Document;

/// Key of the object produced for count-only output.
pub const COUNT_KEY: &str = "$count";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    pub count: bool,
    pub flatten: bool,
}

/// A shaped result, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Shaped {
    Count(usize),
    Value(Value),
    Values(Vec<Value>),
    Documents(Vec<Document>),
}

impl Shaped {
    pub fn into_json(self) -> Value {
        match self {
            Shaped::Count(n) => json!({ COUNT_KEY: n }),
            Shaped::Value(value) => value,
            Shaped::Values(values) => Value::Array(values),
            Shaped::Documents(docs) => Value::Array(docs.into_iter().map(Value::Object).collect()),
        }
    }
}

/// Shape projected documents for output.
///
/// Count takes precedence over flatten. Flatten applies only when exactly one
/// field was projected: each document contributes its value for that field
/// (documents missing it contribute nothing), and a single resulting value is
/// returned bare.
pub fn shape(docs: Vec<Document>, fields: &[String], options: ShapeOptions) -> Shaped {
    if options.count {
        return Shaped::Count(docs.len());
    }

    if options.flatten && fields.len() == 1 {
        let mut values: Vec<Value> = docs
            .into_iter()
            .filter_map(|mut doc| doc.remove(&fields[0]))
            .collect();
        return if values.len() == 1 {
            Shaped::Value(values.remove(0))
        } else {
            Shaped::Values(values)
        };
    }

    Shaped::Documents(docs)
}
