//! Selection parameters: everything a store needs to answer a read.

use crate::path::DocPath;

use super::filter::CompositeFilter;
use super::order::OrderBy;

/// An immutable description of one read request.
///
/// A `limit` of zero means unlimited.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub path: DocPath,
    pub fields: Vec<String>,
    pub filter: Option<CompositeFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: usize,
    pub offset: usize,
    pub count: bool,
}

impl Selection {
    pub fn new(path: DocPath) -> Self {
        Self {
            path,
            fields: Vec::new(),
            filter: None,
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
            count: false,
        }
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn filter(mut self, filter: CompositeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::parse_filter;

    #[test]
    fn test_builder_defaults() {
        let sel = Selection::new(DocPath::parse("users").unwrap());
        assert!(sel.fields.is_empty());
        assert!(sel.filter.is_none());
        assert!(sel.order_by.is_empty());
        assert_eq!((sel.limit, sel.offset, sel.count), (0, 0, false));
    }

    #[test]
    fn test_builder_chain() {
        let sel = Selection::new(DocPath::parse("users").unwrap())
            .fields(vec!["name".to_string()])
            .filter(parse_filter(r#"{"age": {">": 30}}"#).unwrap())
            .order_by(vec![OrderBy::desc("age")])
            .limit(10)
            .offset(5)
            .count(true);
        assert_eq!(sel.fields, vec!["name"]);
        assert!(sel.filter.is_some());
        assert_eq!(sel.order_by, vec![OrderBy::desc("age")]);
        assert_eq!((sel.limit, sel.offset, sel.count), (10, 5, true));
    }
}
