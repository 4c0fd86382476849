//! Delivery pricing
//!
//! Pure zone logic used by the server: range validation, overlap detection
//! and distance → zone → quote resolution. Geocoding and persistence live in
//! the server crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::models::{DeliverySettings, DeliveryZone};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Where a quote's fee came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Zone,
    Fallback,
}

/// Delivery fee and time estimate for one address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryQuote {
    pub source: QuoteSource,
    pub fee: Decimal,
    pub estimated_minutes: i32,
    pub distance_km: Option<f64>,
    pub zone_id: Option<i64>,
    pub zone_name: Option<String>,
}

impl DeliveryQuote {
    pub fn fallback(settings: &DeliverySettings, distance_km: Option<f64>) -> Self {
        Self {
            source: QuoteSource::Fallback,
            fee: settings.fallback_fee,
            estimated_minutes: settings.fallback_estimated_minutes,
            distance_km,
            zone_id: None,
            zone_name: None,
        }
    }

    pub fn from_zone(zone: &DeliveryZone, distance_km: f64) -> Self {
        Self {
            source: QuoteSource::Zone,
            fee: zone.fee,
            estimated_minutes: zone.estimated_minutes,
            distance_km: Some(distance_km),
            zone_id: Some(zone.id),
            zone_name: Some(zone.name.clone()),
        }
    }

    /// Quote used for pickup orders
    pub fn pickup() -> Self {
        Self {
            source: QuoteSource::Zone,
            fee: Decimal::ZERO,
            estimated_minutes: 0,
            distance_km: None,
            zone_id: None,
            zone_name: None,
        }
    }
}

/// Closed-interval intersection: `[a,b]` and `[c,d]` share at least one point.
pub fn ranges_overlap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> bool {
    a_min <= b_max && b_min <= a_max
}

/// Active zone whose range contains `distance_km`.
///
/// Active ranges never overlap, so at most one zone matches; zones are
/// scanned by ascending lower bound to keep the result deterministic even
/// for inconsistent input.
pub fn select_zone(zones: &[DeliveryZone], distance_km: f64) -> Option<&DeliveryZone> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return None;
    }
    let mut active: Vec<&DeliveryZone> = zones.iter().filter(|z| z.is_active).collect();
    active.sort_by(|a, b| a.min_distance_km.total_cmp(&b.min_distance_km));
    active
        .into_iter()
        .find(|z| z.min_distance_km <= distance_km && distance_km <= z.max_distance_km)
}

/// Resolve a quote.
///
/// `distance_km` is `None` when geolocation could not produce a distance.
pub fn quote_for_distance(
    settings: &DeliverySettings,
    zones: &[DeliveryZone],
    distance_km: Option<f64>,
) -> DeliveryQuote {
    if !settings.geolocation_enabled {
        return DeliveryQuote::fallback(settings, None);
    }
    let Some(distance) = distance_km else {
        return DeliveryQuote::fallback(settings, None);
    };
    match select_zone(zones, distance) {
        Some(zone) => DeliveryQuote::from_zone(zone, distance),
        None => DeliveryQuote::fallback(settings, Some(distance)),
    }
}

/// First active zone (other than `exclude_id`) intersecting `[min, max]`.
pub fn find_overlap(
    zones: &[DeliveryZone],
    min_distance_km: f64,
    max_distance_km: f64,
    exclude_id: Option<i64>,
) -> Option<&DeliveryZone> {
    zones.iter().find(|z| {
        z.is_active
            && Some(z.id) != exclude_id
            && ranges_overlap(
                min_distance_km,
                max_distance_km,
                z.min_distance_km,
                z.max_distance_km,
            )
    })
}

/// Reject a range that intersects an active zone, naming the conflict.
pub fn ensure_no_overlap(
    zones: &[DeliveryZone],
    min_distance_km: f64,
    max_distance_km: f64,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    match find_overlap(zones, min_distance_km, max_distance_km, exclude_id) {
        None => Ok(()),
        Some(conflict) => Err(AppError::with_message(
            ErrorCode::ZoneOverlap,
            format!(
                "Range {min_distance_km}-{max_distance_km} km overlaps active zone '{}' ({}-{} km)",
                conflict.name, conflict.min_distance_km, conflict.max_distance_km
            ),
        )
        .with_detail("conflicting_zone_id", conflict.id)
        .with_detail("conflicting_zone_name", conflict.name.clone())),
    }
}

/// Field-level checks shared by create and update.
pub fn validate_zone(
    name: &str,
    min_distance_km: f64,
    max_distance_km: f64,
    fee: Decimal,
    estimated_minutes: i32,
) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty").with_detail("field", "name"));
    }
    if !min_distance_km.is_finite() || !max_distance_km.is_finite() {
        return Err(AppError::validation("distances must be finite numbers"));
    }
    if min_distance_km < 0.0 {
        return Err(AppError::validation("min_distance_km must be >= 0")
            .with_detail("field", "min_distance_km"));
    }
    if max_distance_km <= min_distance_km {
        return Err(
            AppError::validation("max_distance_km must be greater than min_distance_km")
                .with_detail("field", "max_distance_km"),
        );
    }
    if fee.is_sign_negative() {
        return Err(AppError::validation("fee must be >= 0").with_detail("field", "fee"));
    }
    if estimated_minutes <= 0 {
        return Err(AppError::validation("estimated_minutes must be > 0")
            .with_detail("field", "estimated_minutes"));
    }
    Ok(())
}
