//! Declarative query constraints: filters, predicates and relation-count rules

use crate::query::params::SortOrder;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Arbitrary compound predicate over an entity, ANDed into the query as a
/// single clause. The injected-strategy seam that keeps the query builder
/// decoupled from any particular persistence API.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over one related row (as JSON), used by relation-count rules
pub type RowPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Comparison operator for relation-count rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountOp {
    #[default]
    Gte,
    Gt,
    Lte,
    Lt,
    Eq,
    Ne,
}

impl CountOp {
    /// Whether `actual` satisfies this operator against `expected`
    pub fn holds(self, actual: u64, expected: u64) -> bool {
        match self {
            CountOp::Gte => actual >= expected,
            CountOp::Gt => actual > expected,
            CountOp::Lte => actual <= expected,
            CountOp::Lt => actual < expected,
            CountOp::Eq => actual == expected,
            CountOp::Ne => actual != expected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CountOp::Gte => ">=",
            CountOp::Gt => ">",
            CountOp::Lte => "<=",
            CountOp::Lt => "<",
            CountOp::Eq => "=",
            CountOp::Ne => "!=",
        }
    }
}

impl fmt::Display for CountOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown comparison operator string
#[derive(Debug, thiserror::Error)]
#[error("unknown count operator: {0}")]
pub struct UnknownCountOp(pub String);

impl FromStr for CountOp {
    type Err = UnknownCountOp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">=" => Ok(CountOp::Gte),
            ">" => Ok(CountOp::Gt),
            "<=" => Ok(CountOp::Lte),
            "<" => Ok(CountOp::Lt),
            "=" | "==" => Ok(CountOp::Eq),
            "!=" | "<>" => Ok(CountOp::Ne),
            other => Err(UnknownCountOp(other.to_string())),
        }
    }
}

/// Constraint on the number of related rows an entity must have.
///
/// A rule built with just a relation name keeps the defaults of the
/// shorthand forms: count all related rows, require `>= 1`.
///
/// ```rust,ignore
/// // entities with at least 2 related "items" rows named "xyz"
/// RelationCount::new("items")
///     .matching(|row| row["name"] == "xyz")
///     .operator(CountOp::Gte)
///     .count(2)
/// ```
#[derive(Clone)]
pub struct RelationCount {
    pub relation: String,
    pub predicate: Option<RowPredicate>,
    pub operator: CountOp,
    pub count: u64,
}

impl RelationCount {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            predicate: None,
            operator: CountOp::default(),
            count: 1,
        }
    }

    /// Restrict which related rows are counted
    pub fn matching(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn operator(mut self, operator: CountOp) -> Self {
        self.operator = operator;
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Whether the given related rows satisfy this rule
    pub fn satisfied_by(&self, related: &[Value]) -> bool {
        let matching = match &self.predicate {
            Some(predicate) => related.iter().filter(|row| predicate(row)).count() as u64,
            None => related.len() as u64,
        };
        self.operator.holds(matching, self.count)
    }
}

/// Per-operation bundle of query constraints supplied by a resource
/// definition: relations to include, conjunctive static filters, one
/// optional dynamic predicate and relation-count rules. All empty by
/// default.
pub struct Constraints<T> {
    /// Relation names to eagerly include in returned records, in order
    pub with: Vec<String>,
    /// `field = value` pairs, ANDed together
    pub filters: Vec<(String, Value)>,
    /// Dynamic predicate, ANDed in as a single compound clause
    pub predicate: Option<Predicate<T>>,
    /// Relation-count rules, each ANDed independently
    pub relation_counts: Vec<RelationCount>,
}

impl<T> Default for Constraints<T> {
    fn default() -> Self {
        Self {
            with: Vec::new(),
            filters: Vec::new(),
            predicate: None,
            relation_counts: Vec::new(),
        }
    }
}

impl<T> Clone for Constraints<T> {
    fn clone(&self) -> Self {
        Self {
            with: self.with.clone(),
            filters: self.filters.clone(),
            predicate: self.predicate.clone(),
            relation_counts: self.relation_counts.clone(),
        }
    }
}

impl<T> Constraints<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.with.push(relation.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn predicate(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn has(mut self, rule: RelationCount) -> Self {
        self.relation_counts.push(rule);
        self
    }
}

/// Full specification of one read query: the constraint bundle plus
/// pagination and sort, in the shape the [`EntityStore`] executes.
///
/// [`EntityStore`]: crate::core::store::EntityStore
pub struct QuerySpec<T> {
    pub constraints: Constraints<T>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub order: Option<(String, SortOrder)>,
}

impl<T> Default for QuerySpec<T> {
    fn default() -> Self {
        Self {
            constraints: Constraints::default(),
            skip: None,
            take: None,
            order: None,
        }
    }
}

impl<T> Clone for QuerySpec<T> {
    fn clone(&self) -> Self {
        Self {
            constraints: self.constraints.clone(),
            skip: self.skip,
            take: self.take,
            order: self.order.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_op_defaults_and_comparisons() {
        assert_eq!(CountOp::default(), CountOp::Gte);
        assert!(CountOp::Gte.holds(2, 2));
        assert!(CountOp::Gt.holds(3, 2));
        assert!(!CountOp::Gt.holds(2, 2));
        assert!(CountOp::Lte.holds(1, 2));
        assert!(CountOp::Lt.holds(1, 2));
        assert!(CountOp::Eq.holds(2, 2));
        assert!(CountOp::Ne.holds(1, 2));
    }

    #[test]
    fn test_count_op_parses_source_operators() {
        assert_eq!(">=".parse::<CountOp>().unwrap(), CountOp::Gte);
        assert_eq!("<".parse::<CountOp>().unwrap(), CountOp::Lt);
        assert_eq!("==".parse::<CountOp>().unwrap(), CountOp::Eq);
        assert!("~".parse::<CountOp>().is_err());
    }

    #[test]
    fn test_relation_count_defaults_require_one_row() {
        let rule = RelationCount::new("items");
        assert!(!rule.satisfied_by(&[]));
        assert!(rule.satisfied_by(&[json!({"name": "a"})]));
    }

    #[test]
    fn test_relation_count_with_predicate_and_threshold() {
        let rule = RelationCount::new("items")
            .matching(|row| row["name"] == "xyz")
            .count(2);

        let rows = vec![
            json!({"name": "xyz"}),
            json!({"name": "abc"}),
            json!({"name": "xyz"}),
        ];
        assert!(rule.satisfied_by(&rows));
        assert!(!rule.satisfied_by(&rows[..2].to_vec()));
    }

    #[test]
    fn test_constraints_builder_accumulates() {
        let constraints: Constraints<()> = Constraints::new()
            .with("items")
            .with("author")
            .filter("status", "active")
            .has(RelationCount::new("items").count(2));

        assert_eq!(constraints.with, vec!["items", "author"]);
        assert_eq!(
            constraints.filters,
            vec![("status".to_string(), json!("active"))]
        );
        assert!(constraints.predicate.is_none());
        assert_eq!(constraints.relation_counts.len(), 1);
    }
}
