//! Delivery zone management

use axum::extract::{Path, State};
use axum::Json;
use shared::ApiResponse;
use shared::models::{DeliveryZone, DeliveryZoneCreate, DeliveryZoneUpdate};

use crate::api::ApiResult;
use crate::services::delivery;
use crate::state::AppState;

/// GET /api/admin/zones - active and inactive
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<DeliveryZone>> {
    Ok(Json(delivery::list_zones(&state).await?))
}

/// POST /api/admin/zones - 409 when the range overlaps an active zone
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<DeliveryZoneCreate>,
) -> ApiResult<DeliveryZone> {
    Ok(Json(delivery::create_zone(&state, payload).await?))
}

/// PUT /api/admin/zones/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DeliveryZoneUpdate>,
) -> ApiResult<DeliveryZone> {
    Ok(Json(delivery::update_zone(&state, id, payload).await?))
}

/// DELETE /api/admin/zones/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    delivery::delete_zone(&state, id).await?;
    Ok(Json(ApiResponse::ok()))
}
