//! Store delivery settings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Delivery settings (single row)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliverySettings {
    /// Store origin used for distance calculation
    pub store_latitude: f64,
    pub store_longitude: f64,
    /// When false every delivery uses the flat fallback fee
    pub geolocation_enabled: bool,
    pub fallback_fee: Decimal,
    pub fallback_estimated_minutes: i32,
    /// Minimum subtotal accepted at checkout (zero disables the check)
    pub minimum_order: Decimal,
    pub updated_at: i64,
}

/// Update settings payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliverySettingsUpdate {
    pub store_latitude: Option<f64>,
    pub store_longitude: Option<f64>,
    pub geolocation_enabled: Option<bool>,
    pub fallback_fee: Option<Decimal>,
    pub fallback_estimated_minutes: Option<i32>,
    pub minimum_order: Option<Decimal>,
}

impl DeliverySettingsUpdate {
    /// Whether applying this update moves the store origin
    pub fn moves_origin(&self, current: &DeliverySettings) -> bool {
        self.store_latitude
            .is_some_and(|lat| lat != current.store_latitude)
            || self
                .store_longitude
                .is_some_and(|lng| lng != current.store_longitude)
    }
}
