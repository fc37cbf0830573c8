//! Order-by clause parsing.
//!
//! `"age desc, name asc"` (space separator) or `"age:desc,name:asc"` (colon
//! separator) parse into an ordered list of [`OrderBy`] clauses. A clause
//! without a direction sorts ascending.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OrderByError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn token(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Literal between a field and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionSeparator {
    Space,
    Colon,
}

impl DirectionSeparator {
    pub fn as_char(self) -> char {
        match self {
            DirectionSeparator::Space => ' ',
            DirectionSeparator::Colon => ':',
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Parse a comma-separated order-by expression.
///
/// An empty or blank input yields no clauses. Empty clauses (`"a,,b"`),
/// clauses with no field (`":desc"`), directions written with the other
/// separator (`"age desc"` under [`DirectionSeparator::Colon`]) and fields
/// that still contain the separator (`"age sideways"`) are rejected.
pub fn parse_order_by(
    input: &str,
    separator: DirectionSeparator,
) -> Result<Vec<OrderBy>, OrderByError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .map(|clause| parse_clause(clause, separator))
        .collect()
}

fn parse_clause(raw: &str, separator: DirectionSeparator) -> Result<OrderBy, OrderByError> {
    let sep = separator.as_char();
    let clause = raw.trim();
    let malformed = |reason: &str| OrderByError::Malformed {
        clause: raw.to_string(),
        reason: reason.to_string(),
    };

    if clause.is_empty() {
        return Err(malformed("empty clause"));
    }

    let mut direction = Direction::Ascending;
    let mut field = clause;
    for candidate in [Direction::Descending, Direction::Ascending] {
        let suffix = format!("{sep}{}", candidate.token());
        if let Some(stripped) = clause.strip_suffix(suffix.as_str()) {
            direction = candidate;
            field = stripped;
            break;
        }
    }

    let field = field.trim();
    if field.is_empty() {
        return Err(malformed("missing field name"));
    }
    if let Some((_, last)) = field.rsplit_once([' ', ':'])
        && [Direction::Ascending, Direction::Descending]
            .iter()
            .any(|d| d.token() == last)
    {
        return Err(malformed(&format!("direction must follow a '{sep}' separator")));
    }
    if field.contains(sep) {
        return Err(malformed("expected '<field>' followed by an optional 'asc' or 'desc'"));
    }

    Ok(OrderBy {
        field: field.to_string(),
        direction,
    })
}
