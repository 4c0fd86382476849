//! HTTP API routes

pub mod admin;
pub mod delivery;
pub mod health;
pub mod menu;
pub mod orders;
pub mod payment_webhook;
pub mod payments;

use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use shared::error::AppError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Storefront routes (no auth)
fn storefront_router() -> Router<AppState> {
    Router::new()
        .route("/api/menu", get(menu::get_menu))
        .route("/api/categories", get(menu::list_categories))
        .route("/api/products/{id}", get(menu::get_product))
        .route("/api/delivery/quote", post(delivery::quote))
        .route("/api/orders", post(orders::create))
        .route("/api/orders/{id}", get(orders::get_by_id))
        .route("/api/orders/{id}/payment", post(payments::create_payment))
}

/// Create the combined router with middleware
pub fn create_router(state: AppState) -> Router {
    // Payment webhook (signature-verified, raw body)
    let webhook = Router::new().route(
        "/api/payments/webhook",
        post(payment_webhook::handle_webhook),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(storefront_router())
        .merge(webhook)
        .merge(admin::router(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
