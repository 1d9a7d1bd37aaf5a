//! # restkit
//!
//! Derive a conventional REST CRUD surface from an entity definition.
//!
//! Define an entity and a store, and restkit generates the five standard
//! endpoints (list, get-one, create, update, delete) with:
//!
//! - **Pagination & sorting**: `skip`, `limit`, `sort`, `order` query params
//! - **Declarative constraints**: relation inclusion, static filters,
//!   relation-count rules, arbitrary dynamic predicates
//! - **Lifecycle hooks**: shape or decline mutations, transform read
//!   results, replace responses wholesale
//! - **Count metadata**: `X-Result-Count` / `X-Total-Count` headers or a
//!   nested count envelope for list responses
//! - **Typed middleware rules**: attach tower middleware per operation
//!   group, with a catch-all fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restkit::prelude::*;
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Article {
//!     id: Uuid,
//!     title: String,
//! }
//!
//! impl Entity for Article {
//!     type Id = Uuid;
//!     fn resource_name() -> &'static str { "articles" }
//!     fn id(&self) -> Uuid { self.id }
//! }
//!
//! struct Articles { store: MemoryStore<Article> }
//!
//! #[async_trait]
//! impl Resource for Articles {
//!     type Entity = Article;
//!     fn store(&self) -> &dyn EntityStore<Article> { &self.store }
//! }
//!
//! let app = resource_routes_default("articles", Arc::new(Articles {
//!     store: MemoryStore::new(),
//! }));
//! ```

pub mod config;
pub mod core;
pub mod query;
pub mod resource;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{Entity, EntityStore, Payload, Record, RestError};

    // === Query construction ===
    pub use crate::query::{
        Constraints, CountOp, ListParams, Query, RelationCount, SortOrder, build_query,
        build_query_with_count,
    };

    // === Resource lifecycle ===
    pub use crate::resource::{
        ACTION_AVOIDED, Envelope, MutationOutcome, Operation, RequestContext, Resource,
        ResourceController, RestResponse,
    };

    // === Routes ===
    pub use crate::server::{
        MiddlewareRule, RouteConfig, layer_fn, resource_routes, resource_routes_default,
    };

    // === Config ===
    pub use crate::config::ResourceConfig;

    // === Storage ===
    pub use crate::storage::MemoryStore;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use uuid::Uuid;

    // === Axum ===
    pub use axum::{
        Router,
        http::{HeaderMap, StatusCode},
    };

    pub use std::sync::Arc;
}
