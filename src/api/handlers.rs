//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use tracing::warn;

use crate::cache::CacheCoordinator;
use crate::error::ApiError;
use crate::models::{
    DeleteResponse, FlushResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    StatsResponse,
};

/// Header carrying the admin token for destructive operations.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared coordinator handle
    pub cache: CacheCoordinator,
    /// Token required by `DELETE /cache`; None disables the endpoint
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(cache: CacheCoordinator, admin_token: Option<String>) -> Self {
        Self { cache, admin_token }
    }

    fn authorize_admin(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = self.admin_token.as_deref() else {
            return Err(ApiError::Forbidden(
                "Flushing is disabled: no admin token configured".to_string(),
            ));
        };

        let presented = headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        let accepted = presented
            .is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()));
        if accepted {
            Ok(())
        } else {
            warn!("Rejected flush request with missing or wrong admin token");
            Err(ApiError::Unauthorized("Invalid admin token".to_string()))
        }
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let available = state.cache.is_available().await;
    Json(StatsResponse::new(state.cache.stats(), available))
}

/// Handler for DELETE /cache/keys/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.invalidate(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete_pattern(&req.pattern).await;
    Ok(Json(InvalidateResponse::new(req.pattern, removed)))
}

/// Handler for DELETE /cache
pub async fn flush_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FlushResponse>, ApiError> {
    state.authorize_admin(&headers)?;
    state.cache.flush_all().await;
    Ok(Json(FlushResponse::flushed()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.is_available().await))
}
