//! Query model shared by every document store adapter.
//!
//! A [`Query`] is a conjunction of field predicates plus an optional
//! ordering clause. Adapters that cannot push predicates down to their
//! backend evaluate them client-side with [`Query::apply`].

use std::cmp::Ordering;

use super::value::{Document, FieldValue};

/// Comparison operator of a field predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
}

/// Ordering direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Predicate on a single named field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOp::GreaterOrEqual, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOp::LessOrEqual, value)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, FilterOp::Equal, value)
    }

    /// Evaluate the predicate against a document.
    ///
    /// Missing fields never match. Range operators only match values of
    /// the same kind as the bound.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };

        match self.op {
            FilterOp::Equal => actual.same_kind(&self.value) && actual.compare(&self.value).is_eq(),
            FilterOp::GreaterOrEqual => {
                actual.same_kind(&self.value) && actual.compare(&self.value).is_ge()
            }
            FilterOp::LessOrEqual => {
                actual.same_kind(&self.value) && actual.compare(&self.value).is_le()
            }
        }
    }
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Conjunction of predicates with an optional ordering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Check if a document satisfies every predicate.
    ///
    /// An ordering clause also requires the ordered field to be present.
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(order) = &self.order_by {
            if doc.get(&order.field).is_none() {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter and order documents client-side.
    ///
    /// Ties are broken by document id, which is also the order when no
    /// ordering clause is given.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut result: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        match &self.order_by {
            Some(order) => result.sort_by(|a, b| {
                let by_field = compare_field(a, b, &order.field);
                let by_field = match order.direction {
                    Direction::Ascending => by_field,
                    Direction::Descending => by_field.reverse(),
                };
                by_field.then_with(|| a.id.cmp(&b.id))
            }),
            None => result.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        result
    }
}

fn compare_field(a: &Document, b: &Document, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => x.compare(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
