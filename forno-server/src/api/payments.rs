//! Card payment start

use axum::extract::{Path, State};
use axum::Json;

use super::ApiResult;
use crate::services::payments::{self, PaymentSession};
use crate::state::AppState;

/// POST /api/orders/{id}/payment - create a PaymentIntent for a card order
pub async fn create_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PaymentSession> {
    Ok(Json(payments::create_payment(&state, id).await?))
}
