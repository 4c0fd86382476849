//! Category management

use axum::extract::{Path, State};
use axum::Json;
use shared::ApiResponse;
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::api::ApiResult;
use crate::services::catalog;
use crate::state::AppState;

/// GET /api/admin/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(Json(catalog::categories(&state).await?))
}

/// POST /api/admin/categories
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Category> {
    Ok(Json(catalog::create_category(&state, payload).await?))
}

/// PUT /api/admin/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    Ok(Json(catalog::update_category(&state, id, payload).await?))
}

/// DELETE /api/admin/categories/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    catalog::delete_category(&state, id).await?;
    Ok(Json(ApiResponse::ok()))
}
