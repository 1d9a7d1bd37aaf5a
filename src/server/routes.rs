//! Route construction for resource controllers
//!
//! Builds the five conventional routes for a resource and lets the caller
//! pick an operation subset and attach middleware per operation group:
//!
//! - `GET /{prefix}` - list
//! - `GET /{prefix}/{id}` - one
//! - `POST /{prefix}` - create
//! - `PUT /{prefix}/{id}` - update
//! - `DELETE /{prefix}/{id}` - delete

use crate::core::entity::Entity;
use crate::core::error::RestError;
use crate::core::store::Payload;
use crate::query::params::ListParams;
use crate::resource::controller::{RequestContext, Resource, ResourceController};
use crate::resource::response::RestResponse;
use crate::resource::{Operation, UnknownOperation};
use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use serde_json::Value;
use std::sync::Arc;

/// A middleware attachment: any function wrapping a router, typically
/// `|router| router.layer(...)`. Type-erased so one rule list can mix
/// arbitrary tower layers.
pub type RouteLayer = Arc<dyn Fn(Router) -> Router + Send + Sync>;

/// Wrap a router-transforming closure into a [`RouteLayer`]
pub fn layer_fn(f: impl Fn(Router) -> Router + Send + Sync + 'static) -> RouteLayer {
    Arc::new(f)
}

/// Middleware for a named group of operations. The first rule naming an
/// operation wins; operations no rule names fall back to the config's
/// default layer list.
pub struct MiddlewareRule {
    pub operations: Vec<Operation>,
    pub layers: Vec<RouteLayer>,
}

impl MiddlewareRule {
    /// Build a rule from a comma-combined operation list, e.g.
    /// `MiddlewareRule::on("create,update", vec![auth])`.
    pub fn on(operations: &str, layers: Vec<RouteLayer>) -> Result<Self, UnknownOperation> {
        Ok(Self {
            operations: Operation::parse_list(operations)?,
            layers,
        })
    }

    pub fn for_operations(operations: Vec<Operation>, layers: Vec<RouteLayer>) -> Self {
        Self { operations, layers }
    }
}

/// Route-level configuration for one resource
#[derive(Default)]
pub struct RouteConfig {
    /// Operations to expose; `None` exposes all five
    pub operations: Option<Vec<Operation>>,
    /// Ordered middleware rules, matched first-wins per operation
    pub rules: Vec<MiddlewareRule>,
    /// Catch-all layers for operations no rule names
    pub fallback: Vec<RouteLayer>,
}

impl RouteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(mut self, operations: Vec<Operation>) -> Self {
        self.operations = Some(operations);
        self
    }

    pub fn rule(mut self, rule: MiddlewareRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn fallback(mut self, layers: Vec<RouteLayer>) -> Self {
        self.fallback = layers;
        self
    }

    fn includes(&self, operation: Operation) -> bool {
        self.operations
            .as_ref()
            .is_none_or(|operations| operations.contains(&operation))
    }

    fn layers_for(&self, operation: Operation) -> &[RouteLayer] {
        self.rules
            .iter()
            .find(|rule| rule.operations.contains(&operation))
            .map(|rule| rule.layers.as_slice())
            .unwrap_or(&self.fallback)
    }
}

/// Build the REST routes for a resource under the given path prefix.
/// Each operation's route is wrapped in its rule's layers before merging,
/// so middleware applies per operation group.
pub fn resource_routes<R: Resource>(
    prefix: &str,
    resource: Arc<R>,
    config: RouteConfig,
) -> Router {
    let controller = ResourceController::new(resource);
    let root = format!("/{}", prefix.trim_matches('/'));
    let item = format!("{root}/{{id}}");

    let mut router = Router::new();
    for operation in Operation::ALL {
        if !config.includes(operation) {
            continue;
        }
        let route = match operation {
            Operation::List => Router::new().route(&root, get(list_handler::<R>)),
            Operation::One => Router::new().route(&item, get(one_handler::<R>)),
            Operation::Create => Router::new().route(&root, post(create_handler::<R>)),
            Operation::Update => Router::new().route(&item, put(update_handler::<R>)),
            Operation::Delete => Router::new().route(&item, delete(delete_handler::<R>)),
        }
        .with_state(controller.clone());
        let wrapped = config
            .layers_for(operation)
            .iter()
            .fold(route, |router, layer| layer(router));
        router = router.merge(wrapped);
    }
    router
}

/// Build the REST routes with default configuration (all five operations,
/// no middleware)
pub fn resource_routes_default<R: Resource>(prefix: &str, resource: Arc<R>) -> Router {
    resource_routes(prefix, resource, RouteConfig::default())
}

async fn list_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<RestResponse, RestError> {
    controller
        .list(RequestContext {
            params,
            body: Payload::new(),
            headers,
        })
        .await
}

async fn one_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<RestResponse, RestError> {
    // an unparseable id cannot name an existing entity
    let Ok(id) = id.parse::<<R::Entity as Entity>::Id>() else {
        return Ok(RestResponse::not_found(id));
    };
    controller
        .one(
            &id,
            RequestContext {
                headers,
                ..Default::default()
            },
        )
        .await
}

async fn create_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<RestResponse, RestError> {
    controller
        .create(RequestContext {
            body: body.as_object().cloned().unwrap_or_default(),
            headers,
            ..Default::default()
        })
        .await
}

async fn update_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<RestResponse, RestError> {
    let Ok(id) = id.parse::<<R::Entity as Entity>::Id>() else {
        return Ok(RestResponse::not_found(id));
    };
    controller
        .update(
            &id,
            RequestContext {
                body: body.as_object().cloned().unwrap_or_default(),
                headers,
                ..Default::default()
            },
        )
        .await
}

async fn delete_handler<R: Resource>(
    State(controller): State<ResourceController<R>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<RestResponse, RestError> {
    let Ok(id) = id.parse::<<R::Entity as Entity>::Id>() else {
        return Ok(RestResponse::not_found(id));
    };
    controller
        .delete(
            &id,
            RequestContext {
                headers,
                ..Default::default()
            },
        )
        .await
}
