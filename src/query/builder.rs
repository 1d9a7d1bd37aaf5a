//! Query assembly: constraint bundle + request parameters -> executable query
//!
//! The assembly order is semantically meaningful and fixed: relation
//! inclusion, then filters, then the dynamic predicate, then relation-count
//! rules; when a total count is requested it is taken at that point, before
//! skip/take/sort are applied, so it always reports the full filtered row
//! count regardless of pagination.

use crate::core::entity::Entity;
use crate::core::store::{EntityStore, Record};
use crate::query::params::{ListParams, SortOrder};
use crate::query::spec::{Constraints, Predicate, QuerySpec, RelationCount};
use anyhow::Result;
use serde_json::Value;

/// A composable read query bound to a store.
///
/// Accumulates a [`QuerySpec`] through the builder methods and executes it
/// through [`get`](Query::get), [`find`](Query::find) and
/// [`count`](Query::count).
pub struct Query<'a, T: Entity> {
    store: &'a dyn EntityStore<T>,
    spec: QuerySpec<T>,
}

impl<'a, T: Entity> Query<'a, T> {
    pub fn new(store: &'a dyn EntityStore<T>) -> Self {
        Self {
            store,
            spec: QuerySpec::default(),
        }
    }

    /// Eagerly include the given relations in returned records
    pub fn with<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec
            .constraints
            .with
            .extend(relations.into_iter().map(Into::into));
        self
    }

    /// AND a `field = value` condition
    pub fn where_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.spec.constraints.filters.push((field.into(), value));
        self
    }

    /// AND an arbitrary compound predicate as a single clause
    pub fn where_fn(mut self, predicate: Predicate<T>) -> Self {
        self.spec.constraints.predicate = Some(predicate);
        self
    }

    /// AND a relation-count rule
    pub fn where_relation_count(mut self, rule: RelationCount) -> Self {
        self.spec.constraints.relation_counts.push(rule);
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.spec.skip = Some(n);
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.spec.take = Some(n);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.spec.order = Some((field.into(), order));
        self
    }

    /// The spec as assembled so far
    pub fn spec(&self) -> &QuerySpec<T> {
        &self.spec
    }

    /// Execute the query and return all matching records
    pub async fn get(&self) -> Result<Vec<Record<T>>> {
        self.store.fetch(&self.spec).await
    }

    /// Find one entity by id under this query's constraints
    pub async fn find(&self, id: &T::Id) -> Result<Option<Record<T>>> {
        self.store.find(&self.spec, id).await
    }

    /// Count matching entities, ignoring pagination
    pub async fn count(&self) -> Result<u64> {
        self.store.count(&self.spec).await
    }
}

/// Assemble a query from a constraint bundle and optional request
/// parameters. Pass `params: None` for id lookups (get-one, update, delete),
/// where pagination and sort do not apply.
pub fn build_query<'a, T: Entity>(
    store: &'a dyn EntityStore<T>,
    constraints: &Constraints<T>,
    params: Option<&ListParams>,
) -> Query<'a, T> {
    apply_params(constrained(store, constraints), params)
}

/// Like [`build_query`], but also execute a `count` against the
/// filtered-but-unpaginated query and return it alongside.
pub async fn build_query_with_count<'a, T: Entity>(
    store: &'a dyn EntityStore<T>,
    constraints: &Constraints<T>,
    params: Option<&ListParams>,
) -> Result<(Query<'a, T>, u64)> {
    let query = constrained(store, constraints);
    // total is taken before skip/take land on the spec
    let total = query.count().await?;
    Ok((apply_params(query, params), total))
}

fn constrained<'a, T: Entity>(
    store: &'a dyn EntityStore<T>,
    constraints: &Constraints<T>,
) -> Query<'a, T> {
    let mut query = Query::new(store);
    if !constraints.with.is_empty() {
        query = query.with(constraints.with.iter().cloned());
    }
    for (field, value) in &constraints.filters {
        query = query.where_field(field.clone(), value.clone());
    }
    if let Some(predicate) = &constraints.predicate {
        query = query.where_fn(predicate.clone());
    }
    for rule in &constraints.relation_counts {
        query = query.where_relation_count(rule.clone());
    }
    query
}

fn apply_params<'a, T: Entity>(mut query: Query<'a, T>, params: Option<&ListParams>) -> Query<'a, T> {
    let Some(params) = params else {
        return query;
    };
    if let Some(skip) = params.skip() {
        query = query.skip(skip);
    }
    if let Some(limit) = params.limit() {
        query = query.take(limit);
    }
    if let Some((field, order)) = params.sort() {
        query = query.order_by(field, order);
    }
    query
}
