//! Cache metrics and invalidation

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::api::ApiResult;
use crate::cache::{CacheKeyInfo, CacheStats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    /// Exact key
    pub key: Option<String>,
    /// Regular expression matched against every key
    pub pattern: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

/// GET /api/admin/cache
pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// GET /api/admin/cache/keys
pub async fn keys(State(state): State<AppState>) -> Json<Vec<CacheKeyInfo>> {
    Json(state.cache.keys())
}

/// POST /api/admin/cache/invalidate
pub async fn invalidate(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> ApiResult<InvalidateResponse> {
    let removed = match (req.key, req.pattern) {
        (Some(key), None) => usize::from(state.cache.invalidate(&key)),
        (None, Some(pattern)) => state.cache.invalidate_pattern(&pattern)?,
        _ => {
            return Err(AppError::validation(
                "Provide exactly one of 'key' or 'pattern'",
            ));
        }
    };
    tracing::info!(removed, "Cache entries invalidated");
    Ok(Json(InvalidateResponse { removed }))
}

/// DELETE /api/admin/cache
pub async fn clear(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.clear();
    tracing::info!(removed, "Cache cleared");
    Json(InvalidateResponse { removed })
}

/// POST /api/admin/cache/stats/reset
pub async fn reset_stats(State(state): State<AppState>) -> Json<CacheStats> {
    state.cache.reset_stats();
    Json(state.cache.stats())
}
