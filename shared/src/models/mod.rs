//! Data models
//!
//! Shared between the server and its API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (snowflake), timestamps are Unix milliseconds.

pub mod category;
pub mod delivery_zone;
pub mod driver;
pub mod order;
pub mod product;
pub mod settings;

// Re-exports
pub use category::*;
pub use delivery_zone::*;
pub use driver::*;
pub use order::*;
pub use product::*;
pub use settings::*;
