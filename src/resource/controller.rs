//! The request lifecycle for the five CRUD operations
//!
//! Every operation runs the same state machine: resolve the operation's
//! query constraints, assemble the query, run the "before" hook, perform
//! the read or mutation, run the "after" hook, emit an envelope. Two paths
//! leave the default track: a before-hook may decline a mutation (the
//! non-error "Action avoided" short-circuit) and an id lookup may miss
//! (the 404 error envelope). After-hooks may return a full replacement
//! response, which the controller passes through untouched.

use crate::core::entity::Entity;
use crate::core::error::RestError;
use crate::core::store::{EntityStore, Payload};
use crate::query::builder::{build_query, build_query_with_count};
use crate::query::params::ListParams;
use crate::query::spec::Constraints;
use crate::resource::Operation;
use crate::resource::response::{RestResponse, X_RESULT_COUNT, X_TOTAL_COUNT};
use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Everything an operation sees of the incoming request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Pagination and sort parameters (meaningful for list only)
    pub params: ListParams,
    /// The JSON object body (create and update)
    pub body: Payload,
    /// Request headers, for hooks that need auth or tenant information
    pub headers: HeaderMap,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            params: ListParams::default(),
            body: Payload::new(),
            headers: HeaderMap::new(),
        }
    }
}

impl RequestContext {
    pub fn with_params(params: ListParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn with_body(body: Payload) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }
}

/// Outcome of a before-create or before-update hook: either the payload to
/// persist, or a deliberate refusal that still responds success.
pub enum MutationOutcome {
    Proceed(Payload),
    Avoid,
}

/// A resource definition: the entity's store, its per-operation query
/// constraints, and the lifecycle hooks. Every method has a default, so a
/// minimal resource only names its entity type and store.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Entity: Entity;

    fn store(&self) -> &dyn EntityStore<Self::Entity>;

    /// Query constraints scoping the given operation. Defaults to none.
    fn constraints(&self, _operation: Operation) -> Constraints<Self::Entity> {
        Constraints::default()
    }

    /// Nest result/total counts inside the list envelope's `data`
    fn count_metadata(&self) -> bool {
        false
    }

    /// Attach `X-Result-Count` / `X-Total-Count` headers to list responses
    fn count_headers(&self) -> bool {
        true
    }

    /// Per-item transform applied after every read (list items and get-one).
    /// Receives the serialized item and may return it augmented.
    async fn after_read(&self, item: Value, _request: &RequestContext) -> Value {
        item
    }

    /// Shape the payload a create will persist, or avoid the create
    async fn before_create(&self, request: &RequestContext) -> MutationOutcome {
        MutationOutcome::Proceed(request.body.clone())
    }

    /// Shape the payload an update will merge, or avoid the update
    async fn before_update(
        &self,
        _entity: &Self::Entity,
        request: &RequestContext,
    ) -> MutationOutcome {
        MutationOutcome::Proceed(request.body.clone())
    }

    /// Gate a delete; returning false avoids it without error
    async fn before_delete(&self, _entity: &Self::Entity, _request: &RequestContext) -> bool {
        true
    }

    /// Optionally replace the default create response
    async fn after_create(
        &self,
        _entity: &Self::Entity,
        _request: &RequestContext,
    ) -> Option<RestResponse> {
        None
    }

    /// Optionally replace the default update response
    async fn after_update(
        &self,
        _entity: &Self::Entity,
        _request: &RequestContext,
    ) -> Option<RestResponse> {
        None
    }

    /// Optionally replace the default delete response
    async fn after_delete(
        &self,
        _entity: &Self::Entity,
        _request: &RequestContext,
    ) -> Option<RestResponse> {
        None
    }
}

/// Drives the CRUD lifecycle for one resource definition. Cheap to clone;
/// no state survives across requests.
pub struct ResourceController<R: Resource> {
    resource: Arc<R>,
}

impl<R: Resource> Clone for ResourceController<R> {
    fn clone(&self) -> Self {
        Self {
            resource: Arc::clone(&self.resource),
        }
    }
}

impl<R: Resource> ResourceController<R> {
    pub fn new(resource: Arc<R>) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// List entities matching the resource's constraints, paginated and
    /// sorted per the request parameters.
    pub async fn list(&self, request: RequestContext) -> Result<RestResponse, RestError> {
        let constraints = self.resource.constraints(Operation::List);
        let (query, total) =
            build_query_with_count(self.resource.store(), &constraints, Some(&request.params))
                .await?;
        let records = query.get().await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let item = record.to_value()?;
            items.push(self.resource.after_read(item, &request).await);
        }
        let result_count = items.len() as u64;
        debug!(
            resource = R::Entity::resource_name(),
            result_count, total, "listed entities"
        );

        let data = if self.resource.count_metadata() {
            json!({
                "result_count": result_count,
                "total_count": total,
                "data": items,
            })
        } else {
            Value::Array(items)
        };
        let mut response = RestResponse::success(data);
        if self.resource.count_headers() {
            response = response
                .header(X_RESULT_COUNT, result_count)
                .header(X_TOTAL_COUNT, total);
        }
        Ok(response)
    }

    /// Return one entity by id, or the not-found envelope
    pub async fn one(
        &self,
        id: &<R::Entity as Entity>::Id,
        request: RequestContext,
    ) -> Result<RestResponse, RestError> {
        let constraints = self.resource.constraints(Operation::One);
        let query = build_query(self.resource.store(), &constraints, None);
        let Some(record) = query.find(id).await? else {
            return Ok(RestResponse::not_found(id));
        };
        let item = self.resource.after_read(record.to_value()?, &request).await;
        Ok(RestResponse::success(item))
    }

    /// Create an entity from the hook-shaped payload. Responds 201 with the
    /// new id unless the hook avoids the create or overrides the response.
    pub async fn create(&self, request: RequestContext) -> Result<RestResponse, RestError> {
        let payload = match self.resource.before_create(&request).await {
            MutationOutcome::Proceed(payload) => payload,
            MutationOutcome::Avoid => {
                debug!(
                    resource = R::Entity::resource_name(),
                    "create avoided by hook"
                );
                return Ok(RestResponse::avoided(Value::Null));
            }
        };
        let entity = self.resource.store().create(payload).await?;
        debug!(
            resource = R::Entity::resource_name(),
            id = %entity.id(),
            "created entity"
        );
        if let Some(response) = self.resource.after_create(&entity, &request).await {
            return Ok(response);
        }
        Ok(RestResponse::success_with(
            StatusCode::CREATED,
            json!({ "id": entity.id() }),
        ))
    }

    /// Merge the hook-shaped payload into an existing entity and persist it
    pub async fn update(
        &self,
        id: &<R::Entity as Entity>::Id,
        request: RequestContext,
    ) -> Result<RestResponse, RestError> {
        let mut constraints = self.resource.constraints(Operation::Update);
        // relations are not needed to mutate
        constraints.with.clear();
        let query = build_query(self.resource.store(), &constraints, None);
        let Some(record) = query.find(id).await? else {
            return Ok(RestResponse::not_found(id));
        };

        let payload = match self.resource.before_update(&record.entity, &request).await {
            MutationOutcome::Proceed(payload) => payload,
            MutationOutcome::Avoid => {
                debug!(
                    resource = R::Entity::resource_name(),
                    id = %id,
                    "update avoided by hook"
                );
                return Ok(RestResponse::avoided(serde_json::to_value(id)?));
            }
        };
        let entity = self.resource.store().save(record.entity, payload).await?;
        debug!(resource = R::Entity::resource_name(), id = %id, "updated entity");
        if let Some(response) = self.resource.after_update(&entity, &request).await {
            return Ok(response);
        }
        Ok(RestResponse::success_with(
            StatusCode::NO_CONTENT,
            json!({ "id": entity.id() }),
        ))
    }

    /// Delete an existing entity, subject to the before-delete gate
    pub async fn delete(
        &self,
        id: &<R::Entity as Entity>::Id,
        request: RequestContext,
    ) -> Result<RestResponse, RestError> {
        let mut constraints = self.resource.constraints(Operation::Delete);
        constraints.with.clear();
        let query = build_query(self.resource.store(), &constraints, None);
        let Some(record) = query.find(id).await? else {
            return Ok(RestResponse::not_found(id));
        };

        if !self.resource.before_delete(&record.entity, &request).await {
            debug!(
                resource = R::Entity::resource_name(),
                id = %id,
                "delete avoided by hook"
            );
            return Ok(RestResponse::avoided(serde_json::to_value(id)?));
        }
        self.resource.store().delete(&record.entity).await?;
        debug!(resource = R::Entity::resource_name(), id = %id, "deleted entity");
        if let Some(response) = self.resource.after_delete(&record.entity, &request).await {
            return Ok(response);
        }
        Ok(RestResponse::success_with(
            StatusCode::ACCEPTED,
            json!({ "id": record.entity.id() }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::response::ACTION_AVOIDED;
    use crate::storage::MemoryStore;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Note {
        id: u64,
        name: String,
        #[serde(default)]
        locked: bool,
    }

    impl Entity for Note {
        type Id = u64;

        fn resource_name() -> &'static str {
            "notes"
        }

        fn id(&self) -> u64 {
            self.id
        }
    }

    struct Notes {
        store: MemoryStore<Note>,
        metadata: bool,
    }

    #[async_trait]
    impl Resource for Notes {
        type Entity = Note;

        fn store(&self) -> &dyn EntityStore<Note> {
            &self.store
        }

        fn count_metadata(&self) -> bool {
            self.metadata
        }

        async fn before_create(&self, request: &RequestContext) -> MutationOutcome {
            // empty payloads abort the create
            if request.body.is_empty() {
                MutationOutcome::Avoid
            } else {
                MutationOutcome::Proceed(request.body.clone())
            }
        }

        async fn before_delete(&self, entity: &Note, _request: &RequestContext) -> bool {
            !entity.locked
        }
    }

    fn controller(metadata: bool) -> ResourceController<Notes> {
        let store = MemoryStore::new();
        for (id, name, locked) in [(1, "a", false), (2, "b", true), (3, "c", false)] {
            store
                .put(Note {
                    id,
                    name: name.to_string(),
                    locked,
                })
                .unwrap();
        }
        ResourceController::new(Arc::new(Notes {
            store,
            metadata,
        }))
    }

    fn object(value: Value) -> Payload {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_list_bare_array_with_count_headers() {
        let controller = controller(false);
        let response = controller.list(RequestContext::default()).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.success);
        assert_eq!(response.body.data.as_array().unwrap().len(), 3);
        let headers = response.headers();
        assert_eq!(headers[0].0, X_RESULT_COUNT);
        assert_eq!(headers[0].1, axum::http::HeaderValue::from(3u64));
        assert_eq!(headers[1].0, X_TOTAL_COUNT);
    }

    #[tokio::test]
    async fn test_list_count_metadata_mode() {
        let controller = controller(true);
        let params = ListParams {
            skip: 1,
            limit: 1,
            sort: "name".to_string(),
            ..Default::default()
        };
        let response = controller
            .list(RequestContext::with_params(params))
            .await
            .unwrap();

        let data = &response.body.data;
        assert_eq!(data["result_count"], 1);
        assert_eq!(data["total_count"], 3);
        assert_eq!(data["data"][0]["name"], "b");
    }

    #[tokio::test]
    async fn test_one_found_and_missing() {
        let controller = controller(false);

        let response = controller
            .one(&1, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.data["name"], "a");

        let response = controller
            .one(&99, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(!response.body.success);
        assert_eq!(
            response.body.data["reason"],
            "Entity with 99 id does not exist"
        );
    }

    #[tokio::test]
    async fn test_create_returns_new_id() {
        let controller = controller(false);
        let request =
            RequestContext::with_body(object(json!({"id": 4, "name": "d"})));
        let response = controller.create(request).await.unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body.data, json!({"id": 4}));
    }

    #[tokio::test]
    async fn test_create_avoided_inserts_nothing() {
        let controller = controller(false);
        let response = controller
            .create(RequestContext::default())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.success);
        assert_eq!(response.body.data["id"], Value::Null);
        assert_eq!(response.body.data["description"], ACTION_AVOIDED);

        let list = controller.list(RequestContext::default()).await.unwrap();
        assert_eq!(list.body.data.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_merges_and_reports_id() {
        let controller = controller(false);
        let request = RequestContext::with_body(object(json!({"name": "a2"})));
        let response = controller.update(&1, request).await.unwrap();

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(response.body.data, json!({"id": 1}));

        let one = controller
            .one(&1, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(one.body.data["name"], "a2");
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let controller = controller(false);
        let request = RequestContext::with_body(object(json!({"name": "x"})));
        let response = controller.update(&42, request).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_and_delete_gate() {
        let controller = controller(false);

        let response = controller
            .delete(&1, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert_eq!(response.body.data, json!({"id": 1}));

        // locked entity: gate refuses, row survives
        let response = controller
            .delete(&2, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body.data,
            json!({"id": 2, "description": ACTION_AVOIDED})
        );
        let one = controller
            .one(&2, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(one.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found() {
        let controller = controller(false);
        let response = controller
            .delete(&42, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    struct Overriding {
        store: MemoryStore<Note>,
    }

    #[async_trait]
    impl Resource for Overriding {
        type Entity = Note;

        fn store(&self) -> &dyn EntityStore<Note> {
            &self.store
        }

        async fn after_create(
            &self,
            entity: &Note,
            _request: &RequestContext,
        ) -> Option<RestResponse> {
            Some(RestResponse::success(
                json!({"custom": true, "id": entity.id}),
            ))
        }

        async fn after_update(
            &self,
            entity: &Note,
            _request: &RequestContext,
        ) -> Option<RestResponse> {
            Some(RestResponse::success(
                json!({"updated": entity.name, "id": entity.id}),
            ))
        }

        async fn after_delete(
            &self,
            entity: &Note,
            _request: &RequestContext,
        ) -> Option<RestResponse> {
            Some(RestResponse::success(json!({"removed": entity.id})))
        }
    }

    fn overriding_controller() -> ResourceController<Overriding> {
        let store = MemoryStore::new();
        store
            .put(Note {
                id: 9,
                name: "n".to_string(),
                locked: false,
            })
            .unwrap();
        ResourceController::new(Arc::new(Overriding { store }))
    }

    #[tokio::test]
    async fn test_after_create_response_replaces_default() {
        let controller = ResourceController::new(Arc::new(Overriding {
            store: MemoryStore::new(),
        }));
        let request = RequestContext::with_body(object(json!({"id": 9, "name": "n"})));
        let response = controller.create(request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.data, json!({"custom": true, "id": 9}));
    }

    #[tokio::test]
    async fn test_after_update_response_replaces_default() {
        let controller = overriding_controller();
        let request = RequestContext::with_body(object(json!({"name": "n2"})));
        let response = controller.update(&9, request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.data, json!({"updated": "n2", "id": 9}));
    }

    #[tokio::test]
    async fn test_after_delete_response_replaces_default() {
        let controller = overriding_controller();
        let response = controller
            .delete(&9, RequestContext::default())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body.data, json!({"removed": 9}));

        let gone = controller
            .one(&9, RequestContext::default())
            .await
            .unwrap();
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }
}
