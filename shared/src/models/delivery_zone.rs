//! Delivery Zone Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Distance band with its delivery fee and time estimate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryZone {
    pub id: i64,
    pub name: String,
    /// Inclusive lower bound, kilometres
    pub min_distance_km: f64,
    /// Inclusive upper bound, kilometres
    pub max_distance_km: f64,
    pub fee: Decimal,
    pub estimated_minutes: i32,
    pub is_active: bool,
    pub updated_at: i64,
}

/// Create delivery zone payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZoneCreate {
    pub name: String,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub fee: Decimal,
    pub estimated_minutes: i32,
    pub is_active: Option<bool>,
}

/// Update delivery zone payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZoneUpdate {
    pub name: Option<String>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub fee: Option<Decimal>,
    pub estimated_minutes: Option<i32>,
    pub is_active: Option<bool>,
}
