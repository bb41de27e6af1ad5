//! Error types for the cache coordinator
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Backend Error ==
/// Failure reported by a key-value backend.
///
/// Never crosses the coordinator boundary: every backend failure is logged
/// and the operation degrades to "cache unavailable".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is down or was switched off
    #[error("Backend unavailable")]
    Unavailable,

    /// A single operation failed
    #[error("Backend operation failed: {0}")]
    Operation(String),
}

// == Fetch Error ==
/// Failure of an origin fetch, shared by every caller awaiting the same key.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The origin fetcher returned an error
    #[error("Origin fetch failed: {0}")]
    Origin(Arc<anyhow::Error>),

    /// The origin fetcher panicked or its task was aborted
    #[error("Origin fetch panicked: {0}")]
    Panicked(String),

    /// The origin fetcher did not settle within the configured timeout
    #[error("Origin fetch timed out after {0:?}")]
    TimedOut(Duration),
}

impl FetchError {
    /// Wraps any origin error.
    pub fn origin(err: impl Into<anyhow::Error>) -> Self {
        FetchError::Origin(Arc::new(err.into()))
    }
}

// == Cache Error ==
/// Caller-facing error of the coordinator.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Origin fetch failed; no cached value existed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The cached or shared value does not fit the requested type
    #[error("Failed to decode value: {0}")]
    Decode(String),

    /// The key is not usable
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == API Error ==
/// Errors returned by the administrative HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or wrong admin token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Operation disabled by configuration
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Convenience Result type for coordinator calls.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
