//! Delivery settings

use axum::extract::State;
use axum::Json;
use shared::models::{DeliverySettings, DeliverySettingsUpdate};

use crate::api::ApiResult;
use crate::services::delivery;
use crate::state::AppState;

/// GET /api/admin/settings
pub async fn get(State(state): State<AppState>) -> ApiResult<DeliverySettings> {
    Ok(Json(delivery::settings(&state).await?))
}

/// PUT /api/admin/settings
pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<DeliverySettingsUpdate>,
) -> ApiResult<DeliverySettings> {
    Ok(Json(delivery::update_settings(&state, payload).await?))
}
