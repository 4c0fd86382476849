//! Product management

use axum::extract::{Path, State};
use axum::Json;
use shared::ApiResponse;
use shared::models::{Product, ProductCreate, ProductUpdate};

use crate::api::ApiResult;
use crate::services::catalog;
use crate::state::AppState;

/// GET /api/admin/products - includes unavailable products
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Product>> {
    Ok(Json(catalog::products(&state).await?))
}

/// GET /api/admin/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    Ok(Json(catalog::product(&state, id).await?))
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductCreate>,
) -> ApiResult<Product> {
    Ok(Json(catalog::create_product(&state, payload).await?))
}

/// PUT /api/admin/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    Ok(Json(catalog::update_product(&state, id, payload).await?))
}

/// DELETE /api/admin/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    catalog::delete_product(&state, id).await?;
    Ok(Json(ApiResponse::ok()))
}
