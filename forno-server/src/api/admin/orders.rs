//! Order management

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use shared::OrderStatus;
use shared::models::{Order, OrderAssignDriver, OrderDetail, OrderStatusUpdate};

use crate::api::ApiResult;
use crate::auth::AdminIdentity;
use crate::db::orders::OrderFilter;
use crate::services::orders::{self, DEFAULT_PAGE_SIZE, OrderPage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub driver_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/admin/orders?status=&driver_id=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<OrderPage> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(OrderStatus::parse)
        .transpose()?;
    let filter = OrderFilter {
        status,
        driver_id: query.driver_id,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
    };
    Ok(Json(orders::list(&state, filter).await?))
}

/// GET /api/admin/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    Ok(Json(orders::detail(&state, id).await?))
}

/// PUT /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> ApiResult<Order> {
    tracing::debug!(order_id = id, admin = %identity.username, status = %payload.status, "Status change requested");
    Ok(Json(orders::update_status(&state, id, payload).await?))
}

/// PUT /api/admin/orders/{id}/driver
pub async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderAssignDriver>,
) -> ApiResult<Order> {
    Ok(Json(
        orders::assign_driver(&state, id, payload.driver_id).await?,
    ))
}
