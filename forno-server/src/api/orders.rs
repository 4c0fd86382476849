//! Checkout and order tracking

use axum::extract::{Path, State};
use axum::Json;
use shared::models::{OrderCreate, OrderDetail};

use super::ApiResult;
use crate::services::orders;
use crate::state::AppState;

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<OrderCreate>,
) -> ApiResult<OrderDetail> {
    Ok(Json(orders::checkout(&state, payload).await?))
}

/// GET /api/orders/{id} - order with items and status history
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    Ok(Json(orders::detail(&state, id).await?))
}
