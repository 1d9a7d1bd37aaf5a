//! Success/error response envelope shared by all operations
//!
//! Every response carries `{"success": bool, "data": ...}`. List responses
//! may additionally report result/total counts, either nested inside `data`
//! (count-metadata mode) or as `X-Result-Count` / `X-Total-Count` headers.

use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt::Display;

/// Description reported when a hook deliberately declines a mutation
pub const ACTION_AVOIDED: &str = "Action avoided";

/// Number of items in the current list response
pub const X_RESULT_COUNT: HeaderName = HeaderName::from_static("x-result-count");
/// Filtered row count before pagination
pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// The JSON body every operation responds with
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub data: Value,
}

/// A fully formed REST response: status, optional headers and the envelope.
/// Constructed fresh per response; after-hooks may return one to replace
/// the default entirely.
#[derive(Debug)]
pub struct RestResponse {
    pub status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Envelope,
}

impl RestResponse {
    /// HTTP 200 success envelope
    pub fn success(data: Value) -> Self {
        Self::success_with(StatusCode::OK, data)
    }

    pub fn success_with(status: StatusCode, data: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Envelope {
                success: true,
                data,
            },
        }
    }

    pub fn error(status: StatusCode, data: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Envelope {
                success: false,
                data,
            },
        }
    }

    /// The 404 envelope for an identifier with no matching entity
    pub fn not_found(id: impl Display) -> Self {
        Self::error(
            StatusCode::NOT_FOUND,
            json!({ "reason": format!("Entity with {id} id does not exist") }),
        )
    }

    /// The non-error short-circuit envelope emitted when a before-hook
    /// declines a mutation. Create passes a null id; update and delete pass
    /// the id they were invoked with.
    pub fn avoided(id: Value) -> Self {
        Self::success(json!({ "id": id, "description": ACTION_AVOIDED }))
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<HeaderValue>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

impl IntoResponse for RestResponse {
    fn into_response(self) -> Response {
        let RestResponse {
            status,
            headers,
            body,
        } = self;
        let mut response = (status, Json(body)).into_response();
        for (name, value) in headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
