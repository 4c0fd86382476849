//! Delivery pricing: settings, zones and address quotes
//!
//! Every zone write and every store-origin move flags all geocoded addresses
//! dirty in the same transaction, so a stored distance/zone is only reused
//! while it was computed against the current zone table and origin.

use shared::delivery::{self, DeliveryQuote};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DeliverySettings, DeliverySettingsUpdate, DeliveryZone, DeliveryZoneCreate,
    DeliveryZoneUpdate,
};
use shared::GeoPoint;

use crate::cache::keys;
use crate::db;
use crate::db::geocoded_addresses::GeocodedAddress;
use crate::error::{ServiceError, ServiceResult};
use crate::geo::normalize_address;
use crate::state::AppState;
use crate::validation::{MAX_ADDRESS_LEN, validate_coordinates, validate_required_text};

// ── Settings ──

pub async fn settings(state: &AppState) -> ServiceResult<DeliverySettings> {
    super::cached(&state.cache, keys::SETTINGS, || async {
        db::settings::get(&state.pool)
            .await
            .map_err(ServiceError::from)
    })
    .await
}

pub fn validate_settings_update(
    current: &DeliverySettings,
    data: &DeliverySettingsUpdate,
) -> Result<(), AppError> {
    validate_coordinates(
        data.store_latitude.unwrap_or(current.store_latitude),
        data.store_longitude.unwrap_or(current.store_longitude),
    )?;
    if let Some(fee) = data.fallback_fee {
        crate::validation::validate_non_negative(fee, "fallback_fee")?;
    }
    if let Some(minimum) = data.minimum_order {
        crate::validation::validate_non_negative(minimum, "minimum_order")?;
    }
    if let Some(minutes) = data.fallback_estimated_minutes
        && minutes <= 0
    {
        return Err(AppError::validation("fallback_estimated_minutes must be > 0")
            .with_detail("field", "fallback_estimated_minutes"));
    }
    Ok(())
}

pub async fn update_settings(
    state: &AppState,
    data: DeliverySettingsUpdate,
) -> ServiceResult<DeliverySettings> {
    let mut tx = state.pool.begin().await?;
    let current = db::settings::get(&mut *tx).await?;
    validate_settings_update(&current, &data)?;

    let updated = db::settings::update(&mut *tx, &data, shared::util::now_millis()).await?;
    if data.moves_origin(&current) {
        let flagged = db::geocoded_addresses::mark_all_dirty(&mut *tx).await?;
        tracing::info!(flagged, "Store origin moved, geocoded addresses flagged dirty");
    }
    tx.commit().await?;

    state.cache.invalidate(keys::SETTINGS);
    Ok(updated)
}

// ── Zones ──

pub async fn active_zones(state: &AppState) -> ServiceResult<Vec<DeliveryZone>> {
    super::cached(&state.cache, keys::ZONES_ACTIVE, || async {
        db::delivery_zones::list_active(&state.pool)
            .await
            .map_err(ServiceError::from)
    })
    .await
}

pub async fn list_zones(state: &AppState) -> ServiceResult<Vec<DeliveryZone>> {
    Ok(db::delivery_zones::list_all(&state.pool).await?)
}

fn zone_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ZoneNotFound, format!("Delivery zone {id} not found"))
        .with_detail("zone_id", id)
}

fn invalidate_zones(state: &AppState) {
    if let Err(e) = state.cache.invalidate_pattern(keys::ZONES_PATTERN) {
        tracing::error!(error = %e, "Zone cache pattern rejected");
    }
}

/// Apply a partial update to an existing zone.
pub fn merge_zone(current: &DeliveryZone, data: &DeliveryZoneUpdate, now: i64) -> DeliveryZone {
    DeliveryZone {
        id: current.id,
        name: data
            .name
            .as_deref()
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| current.name.clone()),
        min_distance_km: data.min_distance_km.unwrap_or(current.min_distance_km),
        max_distance_km: data.max_distance_km.unwrap_or(current.max_distance_km),
        fee: data.fee.unwrap_or(current.fee),
        estimated_minutes: data.estimated_minutes.unwrap_or(current.estimated_minutes),
        is_active: data.is_active.unwrap_or(current.is_active),
        updated_at: now,
    }
}

pub async fn create_zone(state: &AppState, data: DeliveryZoneCreate) -> ServiceResult<DeliveryZone> {
    delivery::validate_zone(
        &data.name,
        data.min_distance_km,
        data.max_distance_km,
        data.fee,
        data.estimated_minutes,
    )?;

    let mut tx = state.pool.begin().await?;
    db::delivery_zones::lock_for_write(&mut *tx).await?;

    if data.is_active.unwrap_or(true) {
        let zones = db::delivery_zones::list_all(&mut *tx).await?;
        delivery::ensure_no_overlap(&zones, data.min_distance_km, data.max_distance_km, None)?;
    }

    let zone = db::delivery_zones::insert(&mut *tx, &data, shared::util::now_millis()).await?;
    db::geocoded_addresses::mark_all_dirty(&mut *tx).await?;
    tx.commit().await?;

    invalidate_zones(state);
    tracing::info!(
        zone_id = zone.id,
        name = %zone.name,
        min_km = zone.min_distance_km,
        max_km = zone.max_distance_km,
        "Delivery zone created"
    );
    Ok(zone)
}

/// Updates and re-activations are overlap-checked against the other active zones.
pub async fn update_zone(
    state: &AppState,
    id: i64,
    data: DeliveryZoneUpdate,
) -> ServiceResult<DeliveryZone> {
    let mut tx = state.pool.begin().await?;
    db::delivery_zones::lock_for_write(&mut *tx).await?;

    let current = db::delivery_zones::find(&mut *tx, id)
        .await?
        .ok_or_else(|| zone_not_found(id))?;
    let merged = merge_zone(&current, &data, shared::util::now_millis());
    delivery::validate_zone(
        &merged.name,
        merged.min_distance_km,
        merged.max_distance_km,
        merged.fee,
        merged.estimated_minutes,
    )?;

    if merged.is_active {
        let zones = db::delivery_zones::list_all(&mut *tx).await?;
        delivery::ensure_no_overlap(
            &zones,
            merged.min_distance_km,
            merged.max_distance_km,
            Some(id),
        )?;
    }

    let zone = db::delivery_zones::save(&mut *tx, &merged).await?;
    db::geocoded_addresses::mark_all_dirty(&mut *tx).await?;
    tx.commit().await?;

    invalidate_zones(state);
    tracing::info!(zone_id = id, "Delivery zone updated");
    Ok(zone)
}

pub async fn delete_zone(state: &AppState, id: i64) -> ServiceResult<()> {
    let mut tx = state.pool.begin().await?;
    db::delivery_zones::lock_for_write(&mut *tx).await?;
    if !db::delivery_zones::delete(&mut *tx, id).await? {
        return Err(zone_not_found(id).into());
    }
    db::geocoded_addresses::mark_all_dirty(&mut *tx).await?;
    tx.commit().await?;

    invalidate_zones(state);
    tracing::info!(zone_id = id, "Delivery zone deleted");
    Ok(())
}

// ── Quotes ──

/// Delivery fee and time for an address.
///
/// Falls back to the flat fee when geolocation is disabled, no geocoder is
/// configured, the provider has no match or fails, or no active zone covers
/// the distance.
pub async fn quote_for_address(state: &AppState, address: &str) -> ServiceResult<DeliveryQuote> {
    validate_required_text(address, "address", MAX_ADDRESS_LEN)?;
    let settings = settings(state).await?;
    if !settings.geolocation_enabled {
        return Ok(DeliveryQuote::fallback(&settings, None));
    }

    let key = normalize_address(address);
    let zones = active_zones(state).await?;

    if let Some(row) = db::geocoded_addresses::find(&state.pool, &key).await?
        && !row.dirty
    {
        tracing::debug!(address_key = %key, "Geocoded address reused");
        return Ok(delivery::quote_for_distance(
            &settings,
            &zones,
            Some(row.distance_km),
        ));
    }

    let Some(point) = geocode(state, address).await else {
        return Ok(DeliveryQuote::fallback(&settings, None));
    };

    let origin = GeoPoint::new(settings.store_latitude, settings.store_longitude);
    let distance = origin.distance_km(&point);
    let quote = delivery::quote_for_distance(&settings, &zones, Some(distance));

    let row = GeocodedAddress {
        address_key: key,
        latitude: point.latitude,
        longitude: point.longitude,
        distance_km: distance,
        zone_id: quote.zone_id,
        dirty: false,
        verified_at: shared::util::now_millis(),
    };
    if let Err(e) = db::geocoded_addresses::upsert(&state.pool, &row).await {
        tracing::warn!(error = %e, "Failed to store geocoded address");
    }

    Ok(quote)
}

async fn geocode(state: &AppState, address: &str) -> Option<GeoPoint> {
    let Some(geocoder) = &state.geocoder else {
        tracing::debug!("No geocoder configured, using fallback fee");
        return None;
    };
    match geocoder.geocode(address).await {
        Ok(Some(point)) => Some(point),
        Ok(None) => {
            tracing::info!("Address not found by geocoder, using fallback fee");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Geocoding failed, using fallback fee");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn current_settings() -> DeliverySettings {
        DeliverySettings {
            store_latitude: 45.0,
            store_longitude: 9.0,
            geolocation_enabled: true,
            fallback_fee: Decimal::new(300, 2),
            fallback_estimated_minutes: 45,
            minimum_order: Decimal::ZERO,
            updated_at: 0,
        }
    }

    fn zone() -> DeliveryZone {
        DeliveryZone {
            id: 1,
            name: "Centro".into(),
            min_distance_km: 0.0,
            max_distance_km: 3.0,
            fee: Decimal::new(150, 2),
            estimated_minutes: 25,
            is_active: true,
            updated_at: 0,
        }
    }

    #[test]
    fn test_merge_zone_keeps_unset_fields() {
        let update = DeliveryZoneUpdate {
            name: Some("  Centro storico ".into()),
            min_distance_km: None,
            max_distance_km: Some(2.5),
            fee: None,
            estimated_minutes: None,
            is_active: Some(false),
        };
        let merged = merge_zone(&zone(), &update, 99);
        assert_eq!(merged.name, "Centro storico");
        assert_eq!(merged.min_distance_km, 0.0);
        assert_eq!(merged.max_distance_km, 2.5);
        assert_eq!(merged.fee, Decimal::new(150, 2));
        assert!(!merged.is_active);
        assert_eq!(merged.updated_at, 99);
    }

    #[test]
    fn test_settings_update_validation() {
        let current = current_settings();
        assert!(validate_settings_update(&current, &DeliverySettingsUpdate::default()).is_ok());

        let bad_lat = DeliverySettingsUpdate {
            store_latitude: Some(120.0),
            ..Default::default()
        };
        assert!(validate_settings_update(&current, &bad_lat).is_err());

        let bad_fee = DeliverySettingsUpdate {
            fallback_fee: Some(Decimal::new(-100, 2)),
            ..Default::default()
        };
        assert!(validate_settings_update(&current, &bad_fee).is_err());

        let bad_minutes = DeliverySettingsUpdate {
            fallback_estimated_minutes: Some(0),
            ..Default::default()
        };
        assert!(validate_settings_update(&current, &bad_minutes).is_err());
    }
}
