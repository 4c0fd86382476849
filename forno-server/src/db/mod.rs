//! Database access layer
//!
//! Plain SQL over the PgPool. Functions that must run inside a caller's
//! transaction take `impl sqlx::Executor` so they accept both `&PgPool`
//! and `&mut *tx`.

pub mod admins;
pub mod categories;
pub mod delivery_zones;
pub mod drivers;
pub mod geocoded_addresses;
pub mod orders;
pub mod products;
pub mod settings;
pub mod webhook_events;

pub(crate) use shared::util::snowflake_id;
