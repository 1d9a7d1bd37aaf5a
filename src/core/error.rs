//! Typed error handling for the restkit crate
//!
//! The lifecycle controller models exactly one operation-level failure
//! itself (not-found, emitted as a 404 error envelope). Everything else,
//! storage failures included, surfaces as a [`RestError`] and propagates to
//! the caller's error boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures that escape the REST lifecycle.
#[derive(Debug, Error)]
pub enum RestError {
    /// The underlying store failed while executing a query or mutation
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    /// An entity or payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed outside the REST lifecycle");
        let body = json!({ "success": false, "data": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
