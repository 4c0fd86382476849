//! Delivery quote endpoint

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use shared::DeliveryQuote;

use super::ApiResult;
use crate::services::delivery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub address: String,
}

/// POST /api/delivery/quote
pub async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<DeliveryQuote> {
    Ok(Json(delivery::quote_for_address(&state, &req.address).await?))
}
