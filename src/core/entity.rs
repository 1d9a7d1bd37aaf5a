//! Entity trait defining the persistence identity of a resource type

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Base trait for every entity type exposed as a REST resource.
///
/// An entity owns its identifier: `create` payloads deserialize straight into
/// the entity type, so a freshly inserted row gets its id from the payload or
/// from a serde default (e.g. `#[serde(default = "Uuid::new_v4")]`).
///
/// Persistence access is handled separately via the [`EntityStore`] trait to
/// keep this trait free of storage concerns.
///
/// [`EntityStore`]: crate::core::store::EntityStore
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The identifier type. `FromStr` lets route handlers parse the `{id}`
    /// path segment; `Display` feeds the not-found message.
    type Id: Clone + Eq + Hash + Display + FromStr + Serialize + Send + Sync + 'static;

    /// The plural resource name used in URLs (e.g., "users", "articles")
    fn resource_name() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Self::Id;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct TestEntity {
        id: u64,
        name: String,
    }

    impl Entity for TestEntity {
        type Id = u64;

        fn resource_name() -> &'static str {
            "test_entities"
        }

        fn id(&self) -> u64 {
            self.id
        }
    }

    #[test]
    fn test_entity_metadata() {
        let entity = TestEntity {
            id: 7,
            name: "seven".to_string(),
        };

        assert_eq!(TestEntity::resource_name(), "test_entities");
        assert_eq!(entity.id(), 7);
    }

    #[test]
    fn test_entity_roundtrips_through_json() {
        let entity = TestEntity {
            id: 1,
            name: "one".to_string(),
        };

        let value = serde_json::to_value(&entity).unwrap();
        let back: TestEntity = serde_json::from_value(value).unwrap();
        assert_eq!(back.id(), entity.id());
        assert_eq!(back.name, entity.name);
    }
}
