//! Driver management

use axum::extract::{Path, State};
use axum::Json;
use shared::ApiResponse;
use shared::models::{Driver, DriverCreate, DriverUpdate};

use crate::api::ApiResult;
use crate::services::drivers;
use crate::state::AppState;

/// GET /api/admin/drivers
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Driver>> {
    Ok(Json(drivers::list(&state).await?))
}

/// GET /api/admin/drivers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Driver> {
    Ok(Json(drivers::get(&state, id).await?))
}

/// POST /api/admin/drivers
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<DriverCreate>,
) -> ApiResult<Driver> {
    Ok(Json(drivers::create(&state, payload).await?))
}

/// PUT /api/admin/drivers/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DriverUpdate>,
) -> ApiResult<Driver> {
    Ok(Json(drivers::update(&state, id, payload).await?))
}

/// DELETE /api/admin/drivers/{id} - 409 while orders are still open
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    drivers::delete(&state, id).await?;
    Ok(Json(ApiResponse::ok()))
}
