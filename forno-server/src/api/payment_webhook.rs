//! Stripe webhook handler
//!
//! POST /api/payments/webhook. The raw body is needed for signature verification.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::state::AppState;
use crate::{db, payment, services};

/// Handle incoming Stripe webhook events
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(e) =
        payment::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return StatusCode::BAD_REQUEST;
    };
    tracing::info!(event_id, event_type, "Received Stripe webhook");

    let now = shared::util::now_millis();
    match db::webhook_events::record(&state.pool, event_id, event_type, now).await {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Ok(true) => {}
    }

    match services::payments::apply_event(&state, &event).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            let err: shared::AppError = e.into();
            tracing::error!(event_id, error = %err, "Webhook event handling failed");
            // Let the provider retry
            if let Err(e) = db::webhook_events::forget(&state.pool, event_id).await {
                tracing::error!(%e, "Failed to un-record webhook event");
            }
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
