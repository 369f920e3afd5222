//! crates/intervu_core/src/query.rs
//!
//! A value-level description of a document-store query: equality/inequality
//! filters, a single ordering field, and a result limit. Services build
//! these with the fluent methods and hand them to the `DocumentStore` port,
//! which compiles them to whatever the backing store speaks.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One field predicate. `Ne` never matches documents missing the field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_accumulates_filters_in_order() {
        let q = Query::collection("interviews")
            .filter("finalized", FilterOp::Eq, true)
            .filter("userId", FilterOp::Ne, "u1")
            .order_by("createdAt", Direction::Descending)
            .limit(20);

        assert_eq!(q.collection, "interviews");
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[0].field, "finalized");
        assert_eq!(q.filters[0].value, json!(true));
        assert_eq!(q.filters[1].op, FilterOp::Ne);
        assert_eq!(q.order_by, Some(("createdAt".to_string(), Direction::Descending)));
        assert_eq!(q.limit, Some(20));
    }
}
