//! Store trait abstracting the persistence backend for an entity type

use crate::core::entity::Entity;
use crate::query::spec::QuerySpec;
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A JSON-object mutation payload, as produced by before-create and
/// before-update hooks
pub type Payload = Map<String, Value>;

/// One row returned from a read query: the entity itself plus any relation
/// rows the query asked to include.
#[derive(Clone)]
pub struct Record<T> {
    pub entity: T,
    /// Included relation rows, keyed by relation name in inclusion order
    pub included: IndexMap<String, Vec<Value>>,
}

impl<T: Entity> Record<T> {
    /// A record with no included relations
    pub fn bare(entity: T) -> Self {
        Self {
            entity,
            included: IndexMap::new(),
        }
    }

    /// Serialize the entity and attach included relation rows as arrays
    /// under their relation names.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(&self.entity)?;
        if let Value::Object(map) = &mut value {
            for (relation, rows) in &self.included {
                map.insert(relation.clone(), Value::Array(rows.clone()));
            }
        }
        Ok(value)
    }
}

/// Persistence capability of an entity definition.
///
/// Implementations execute the [`QuerySpec`] assembled by the query builder
/// and provide the mutation primitives the lifecycle controller drives.
/// restkit ships [`MemoryStore`] as its reference implementation; SQL or
/// document backends plug in the same way.
///
/// [`MemoryStore`]: crate::storage::MemoryStore
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Execute a read query and return matching records
    async fn fetch(&self, spec: &QuerySpec<T>) -> Result<Vec<Record<T>>>;

    /// Find one entity by id, subject to the spec's constraints
    async fn find(&self, spec: &QuerySpec<T>, id: &T::Id) -> Result<Option<Record<T>>>;

    /// Count entities matching the spec's constraints. Pagination never
    /// affects the count: this is the "total items matching filter" figure.
    async fn count(&self, spec: &QuerySpec<T>) -> Result<u64>;

    /// Create a new entity from a mutation payload
    async fn create(&self, payload: Payload) -> Result<T>;

    /// Merge a mutation payload into an existing entity and persist it
    async fn save(&self, entity: T, payload: Payload) -> Result<T>;

    /// Delete an existing entity
    async fn delete(&self, entity: &T) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Doc {
        id: u64,
        title: String,
    }

    impl Entity for Doc {
        type Id = u64;

        fn resource_name() -> &'static str {
            "docs"
        }

        fn id(&self) -> u64 {
            self.id
        }
    }

    #[test]
    fn test_bare_record_serializes_entity_fields_only() {
        let record = Record::bare(Doc {
            id: 1,
            title: "a".to_string(),
        });
        assert_eq!(record.to_value().unwrap(), json!({"id": 1, "title": "a"}));
    }

    #[test]
    fn test_included_relations_attach_as_arrays() {
        let mut record = Record::bare(Doc {
            id: 1,
            title: "a".to_string(),
        });
        record
            .included
            .insert("comments".to_string(), vec![json!({"body": "hi"})]);
        record.included.insert("tags".to_string(), vec![]);

        let value = record.to_value().unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["comments"], json!([{"body": "hi"}]));
        assert_eq!(value["tags"], json!([]));
    }
}
