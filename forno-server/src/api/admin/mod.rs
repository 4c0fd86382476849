//! Back-office API (JWT authenticated, except login)

mod auth;
mod cache;
mod categories;
mod drivers;
mod orders;
mod products;
mod settings;
mod zones;

use axum::routing::{get, post, put};
use axum::{Router, middleware};

use crate::auth::admin_auth::admin_auth_middleware;
use crate::auth::rate_limit::login_rate_limit;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let login = Router::new()
        .route("/api/admin/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let protected = Router::new()
        .route("/api/admin/me", get(auth::me))
        // Orders
        .route("/api/admin/orders", get(orders::list))
        .route("/api/admin/orders/{id}", get(orders::get_by_id))
        .route("/api/admin/orders/{id}/status", put(orders::update_status))
        .route("/api/admin/orders/{id}/driver", put(orders::assign_driver))
        // Catalog
        .route(
            "/api/admin/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/admin/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route(
            "/api/admin/products",
            get(products::list).post(products::create),
        )
        .route(
            "/api/admin/products/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::delete),
        )
        // Drivers
        .route("/api/admin/drivers", get(drivers::list).post(drivers::create))
        .route(
            "/api/admin/drivers/{id}",
            get(drivers::get_by_id)
                .put(drivers::update)
                .delete(drivers::delete),
        )
        // Delivery
        .route("/api/admin/zones", get(zones::list).post(zones::create))
        .route(
            "/api/admin/zones/{id}",
            put(zones::update).delete(zones::delete),
        )
        .route(
            "/api/admin/settings",
            get(settings::get).put(settings::update),
        )
        // Cache
        .route("/api/admin/cache", get(cache::stats).delete(cache::clear))
        .route("/api/admin/cache/keys", get(cache::keys))
        .route("/api/admin/cache/invalidate", post(cache::invalidate))
        .route("/api/admin/cache/stats/reset", post(cache::reset_stats))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    login.merge(protected)
}
