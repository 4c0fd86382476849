//! forno-server: pizzeria ordering and back-office service
//!
//! - Storefront API: menu, delivery quotes, checkout, card payments
//! - Admin API (JWT): orders, catalog, drivers, delivery zones, settings, cache
//! - Payment provider webhooks (signature-verified, idempotent)

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod logger;
pub mod payment;
pub mod services;
pub mod state;
pub mod util;
pub mod validation;

pub use config::Config;
pub use state::AppState;
