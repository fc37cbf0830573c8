//! Filter expression compiler and evaluator.
//!
//! Filters arrive as JSON objects such as
//! `{"age": {">": 30}, "$or": {"city": "NYC", "vip": true}}` and are compiled
//! into a tree whose root is always a [`CompositeFilter`]. The tree is handed
//! to a [`Store`](crate::store::Store) for execution; stores that evaluate
//! filters in-process use [`CompositeFilter::matches`].

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::projection::resolve_field;
use crate::error::FilterError;
use crate::types::Document;

/// Reserved key introducing a conjunction.
pub const AND_KEY: &str = "$and";

/// Reserved key introducing a disjunction.
pub const OR_KEY: &str = "$or";

/// Maximum nesting depth of composite nodes.
pub const MAX_FILTER_DEPTH: usize = 16;

/// Boolean combinator of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeOperator {
    And,
    Or,
}

impl CompositeOperator {
    /// Resolve a reserved composite key (`$and` / `$or`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            AND_KEY => Some(CompositeOperator::And),
            OR_KEY => Some(CompositeOperator::Or),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            CompositeOperator::And => AND_KEY,
            CompositeOperator::Or => OR_KEY,
        }
    }
}

impl fmt::Display for CompositeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Comparison operator of a field node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    In,
    NotIn,
    ArrayContains,
    ArrayContainsAny,
}

impl FieldOperator {
    pub const ALL: [FieldOperator; 10] = [
        FieldOperator::Equal,
        FieldOperator::NotEqual,
        FieldOperator::GreaterThan,
        FieldOperator::GreaterThanOrEqual,
        FieldOperator::LessThan,
        FieldOperator::LessThanOrEqual,
        FieldOperator::In,
        FieldOperator::NotIn,
        FieldOperator::ArrayContains,
        FieldOperator::ArrayContainsAny,
    ];

    /// Resolve an operator token. Matching is exact and case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    /// The token used in filter JSON.
    pub fn token(self) -> &'static str {
        match self {
            FieldOperator::Equal => "==",
            FieldOperator::NotEqual => "!=",
            FieldOperator::GreaterThan => ">",
            FieldOperator::GreaterThanOrEqual => ">=",
            FieldOperator::LessThan => "<",
            FieldOperator::LessThanOrEqual => "<=",
            FieldOperator::In => "$in",
            FieldOperator::NotIn => "$not-in",
            FieldOperator::ArrayContains => "$array-contains",
            FieldOperator::ArrayContainsAny => "$array-contains-any",
        }
    }

    /// The operator name with the `$` marker stripped, as document stores
    /// spell it (`in`, `not-in`, `array-contains`, ...).
    pub fn store_name(self) -> &'static str {
        self.token().trim_start_matches('$')
    }
}

impl fmt::Display for FieldOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A node of a compiled filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    Composite(CompositeFilter),
    Field(FieldFilter),
}

/// AND / OR over child nodes, kept in the order they appeared in the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeFilter {
    pub operator: CompositeOperator,
    pub children: Vec<FilterExpr>,
}

/// A single `field <op> literal` comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub operator: FieldOperator,
    pub value: Value,
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Decode filter JSON text and compile it.
pub fn parse_filter(text: &str) -> Result<CompositeFilter, FilterError> {
    let body: Value = serde_json::from_str(text)
        .map_err(|e| FilterError::Malformed(format!("query parse failure, {e}")))?;
    match body {
        Value::Object(map) => compile(&map),
        other => Err(FilterError::Malformed(format!(
            "filter must be a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

/// Compile a decoded filter body into a tree rooted at a composite node.
///
/// A body consisting of exactly one `$and` or `$or` key takes that operator
/// for the root; any other body (including an empty one) is an implicit AND
/// over all of its keys. An empty AND matches every document.
pub fn compile(body: &Map<String, Value>) -> Result<CompositeFilter, FilterError> {
    let root = match single_composite_key(body) {
        Some((operator, value)) => {
            compile_composite(operator, nested_body(operator, value)?, 1)?
        }
        None => compile_composite(CompositeOperator::And, body, 1)?,
    };
    debug!(
        operator = %root.operator,
        children = root.children.len(),
        "compiled filter"
    );
    Ok(root)
}

fn single_composite_key(body: &Map<String, Value>) -> Option<(CompositeOperator, &Value)> {
    if body.len() != 1 {
        return None;
    }
    let (key, value) = body.iter().next()?;
    CompositeOperator::from_key(key).map(|op| (op, value))
}

fn nested_body(operator: CompositeOperator, value: &Value) -> Result<&Map<String, Value>, FilterError> {
    value.as_object().ok_or_else(|| {
        FilterError::Malformed(format!(
            "'{operator}' requires an object body, got {}",
            type_name(value)
        ))
    })
}

fn compile_composite(
    operator: CompositeOperator,
    body: &Map<String, Value>,
    depth: usize,
) -> Result<CompositeFilter, FilterError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(FilterError::DepthExceeded {
            max: MAX_FILTER_DEPTH,
        });
    }

    let mut children = Vec::with_capacity(body.len());
    for (key, value) in body {
        let child = match CompositeOperator::from_key(key) {
            Some(nested) => FilterExpr::Composite(compile_composite(
                nested,
                nested_body(nested, value)?,
                depth + 1,
            )?),
            None => FilterExpr::Field(compile_field(key, value)?),
        };
        children.push(child);
    }

    Ok(CompositeFilter { operator, children })
}

/// An object spec names exactly one operator; anything else is an equality
/// literal.
fn compile_field(field: &str, spec: &Value) -> Result<FieldFilter, FilterError> {
    let Value::Object(spec) = spec else {
        return Ok(FieldFilter {
            field: field.to_string(),
            operator: FieldOperator::Equal,
            value: spec.clone(),
        });
    };

    let mut entries = spec.iter();
    let (token, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(FilterError::Malformed(format!(
                "field '{field}' requires exactly one operator, got {}",
                spec.len()
            )));
        }
    };

    let operator = FieldOperator::from_token(token).ok_or_else(|| FilterError::UnknownOperator {
        operator: token.clone(),
        field: field.to_string(),
    })?;

    Ok(FieldFilter {
        field: field.to_string(),
        operator,
        value: value.clone(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

impl FilterExpr {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            FilterExpr::Composite(composite) => composite.matches(doc),
            FilterExpr::Field(field) => field.matches(doc),
        }
    }
}

impl CompositeFilter {
    /// Evaluate against a document body. An empty AND is true, an empty OR
    /// is false.
    pub fn matches(&self, doc: &Document) -> bool {
        match self.operator {
            CompositeOperator::And => self.children.iter().all(|c| c.matches(doc)),
            CompositeOperator::Or => self.children.iter().any(|c| c.matches(doc)),
        }
    }
}

impl FieldFilter {
    /// Evaluate against a document body. A missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = resolve_field(doc, &self.field) else {
            return false;
        };
        let literal = &self.value;

        match self.operator {
            FieldOperator::Equal => values_equal(actual, literal),
            FieldOperator::NotEqual => !values_equal(actual, literal),
            FieldOperator::GreaterThan => compare_values(actual, literal) == Some(Ordering::Greater),
            FieldOperator::GreaterThanOrEqual => matches!(
                compare_values(actual, literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FieldOperator::LessThan => compare_values(actual, literal) == Some(Ordering::Less),
            FieldOperator::LessThanOrEqual => matches!(
                compare_values(actual, literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FieldOperator::In => match literal {
                Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
                _ => false,
            },
            FieldOperator::NotIn => match literal {
                Value::Array(candidates) => !candidates.iter().any(|c| values_equal(actual, c)),
                _ => false,
            },
            FieldOperator::ArrayContains => match actual {
                Value::Array(items) => items.iter().any(|item| values_equal(item, literal)),
                _ => false,
            },
            FieldOperator::ArrayContainsAny => match (actual, literal) {
                (Value::Array(items), Value::Array(candidates)) => items
                    .iter()
                    .any(|item| candidates.iter().any(|c| values_equal(item, c))),
                _ => false,
            },
        }
    }
}

/// Compare two JSON values, returning an ordering if the types are comparable.
///
/// - Numbers: integers exactly, otherwise as f64
/// - Strings: compared lexicographically
/// - Booleans: false < true
/// - Null == Null
/// - Mismatched types, arrays and objects: `None`
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    // One side is a negative i64 and the other a u64 above i64::MAX.
    if a.is_i64() && b.is_u64() {
        return Some(Ordering::Less);
    }
    if a.is_u64() && b.is_i64() {
        return Some(Ordering::Greater);
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Equality that treats `1` and `1.0` as equal and falls back to structural
/// equality for arrays and objects.
fn values_equal(left: &Value, right: &Value) -> bool {
    match compare_values(left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}
