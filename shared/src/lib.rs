//! Shared types for Forno
//!
//! Domain models, the unified error system, the order status state machine
//! and delivery-zone pricing logic. Used by the server and by any Rust client
//! of its HTTP API.

pub mod delivery;
pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use delivery::{DeliveryQuote, GeoPoint, QuoteSource};
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use order::OrderStatus;
