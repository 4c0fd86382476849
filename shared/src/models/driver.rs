//! Driver Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "driver_status", rename_all = "lowercase")
)]
pub enum DriverStatus {
    #[default]
    Available,
    Busy,
    Offline,
}

/// Delivery driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub status: DriverStatus,
    /// Number of non-terminal orders assigned (computed)
    #[cfg_attr(feature = "db", sqlx(default))]
    #[serde(default)]
    pub active_orders: i64,
    pub updated_at: i64,
}

/// Create driver payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverCreate {
    pub name: String,
    pub phone: Option<String>,
}

/// Update driver payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<DriverStatus>,
}
