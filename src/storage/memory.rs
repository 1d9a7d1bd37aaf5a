//! In-memory implementation of EntityStore for testing and development

use crate::core::entity::Entity;
use crate::core::store::{EntityStore, Payload, Record};
use crate::query::params::SortOrder;
use crate::query::spec::{Constraints, QuerySpec};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type RelationRows<Id> = HashMap<String, HashMap<Id, Vec<Value>>>;

/// In-memory entity store.
///
/// Rows keep insertion order, so unsorted lists come back in the order they
/// were created. Related rows are plain JSON values attached per relation
/// name via [`set_related`](MemoryStore::set_related). Uses RwLock for
/// thread-safe access.
#[derive(Clone)]
pub struct MemoryStore<T: Entity> {
    rows: Arc<RwLock<IndexMap<T::Id, T>>>,
    relations: Arc<RwLock<RelationRows<T::Id>>>,
}

impl<T: Entity> MemoryStore<T> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(IndexMap::new())),
            relations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace an entity directly, bypassing the create payload
    /// path. Intended for seeding.
    pub fn put(&self, entity: T) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        rows.insert(entity.id(), entity);
        Ok(())
    }

    /// Attach the related rows of one entity under a relation name
    pub fn set_related(&self, relation: &str, id: T::Id, related: Vec<Value>) -> Result<()> {
        let mut relations = self
            .relations
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        relations
            .entry(relation.to_string())
            .or_default()
            .insert(id, related);
        Ok(())
    }

    fn matches(
        &self,
        constraints: &Constraints<T>,
        entity: &T,
        json: &Value,
        relations: &RelationRows<T::Id>,
    ) -> bool {
        for (field, value) in &constraints.filters {
            if json.get(field) != Some(value) {
                return false;
            }
        }
        if let Some(predicate) = &constraints.predicate {
            if !predicate(entity) {
                return false;
            }
        }
        for rule in &constraints.relation_counts {
            let related = relations
                .get(&rule.relation)
                .and_then(|per_entity| per_entity.get(&entity.id()))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if !rule.satisfied_by(related) {
                return false;
            }
        }
        true
    }

    fn hydrate(&self, entity: T, with: &[String], relations: &RelationRows<T::Id>) -> Record<T> {
        let mut included = IndexMap::new();
        for relation in with {
            let rows = relations
                .get(relation)
                .and_then(|per_entity| per_entity.get(&entity.id()))
                .cloned()
                .unwrap_or_default();
            included.insert(relation.clone(), rows);
        }
        Record { entity, included }
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    async fn fetch(&self, spec: &QuerySpec<T>) -> Result<Vec<Record<T>>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let relations = self
            .relations
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut matched: Vec<(T, Value)> = Vec::new();
        for entity in rows.values() {
            let json = serde_json::to_value(entity)?;
            if self.matches(&spec.constraints, entity, &json, &relations) {
                matched.push((entity.clone(), json));
            }
        }

        if let Some((field, order)) = &spec.order {
            matched.sort_by(|a, b| {
                let ordering = compare_values(
                    a.1.get(field).unwrap_or(&Value::Null),
                    b.1.get(field).unwrap_or(&Value::Null),
                );
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let skipped = matched
            .into_iter()
            .skip(spec.skip.unwrap_or(0) as usize);
        let paged: Vec<(T, Value)> = match spec.take {
            Some(n) => skipped.take(n as usize).collect(),
            None => skipped.collect(),
        };

        Ok(paged
            .into_iter()
            .map(|(entity, _)| self.hydrate(entity, &spec.constraints.with, &relations))
            .collect())
    }

    async fn find(&self, spec: &QuerySpec<T>, id: &T::Id) -> Result<Option<Record<T>>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let relations = self
            .relations
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let Some(entity) = rows.get(id) else {
            return Ok(None);
        };
        let json = serde_json::to_value(entity)?;
        if !self.matches(&spec.constraints, entity, &json, &relations) {
            return Ok(None);
        }
        Ok(Some(self.hydrate(
            entity.clone(),
            &spec.constraints.with,
            &relations,
        )))
    }

    async fn count(&self, spec: &QuerySpec<T>) -> Result<u64> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let relations = self
            .relations
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut count = 0u64;
        for entity in rows.values() {
            let json = serde_json::to_value(entity)?;
            if self.matches(&spec.constraints, entity, &json, &relations) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn create(&self, payload: Payload) -> Result<T> {
        let entity: T = serde_json::from_value(Value::Object(payload))?;
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        if rows.contains_key(&entity.id()) {
            bail!("entity with {} id already exists", entity.id());
        }
        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn save(&self, entity: T, payload: Payload) -> Result<T> {
        let previous_id = entity.id();
        let mut json = serde_json::to_value(&entity)?;
        let Value::Object(map) = &mut json else {
            bail!("entity must serialize to a JSON object");
        };
        for (field, value) in payload {
            map.insert(field, value);
        }
        let updated: T = serde_json::from_value(json)?;

        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        if updated.id() != previous_id {
            rows.shift_remove(&previous_id);
        }
        rows.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, entity: &T) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
        rows.shift_remove(&entity.id());
        Ok(())
    }
}

/// Total ordering over JSON values for sorting: nulls first, then same-type
/// comparison; mixed types fall back to a type rank.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
