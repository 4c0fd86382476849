//! Delivery drivers

use shared::error::{AppError, ErrorCode};
use shared::models::{Driver, DriverCreate, DriverUpdate};

use crate::db;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};

fn driver_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::DriverNotFound, format!("Driver {id} not found"))
        .with_detail("driver_id", id)
}

pub fn validate_driver_fields(name: Option<&str>, phone: &Option<String>) -> Result<(), AppError> {
    if let Some(name) = name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)
}

pub async fn list(state: &AppState) -> ServiceResult<Vec<Driver>> {
    Ok(db::drivers::list(&state.pool).await?)
}

pub async fn get(state: &AppState, id: i64) -> ServiceResult<Driver> {
    db::drivers::find(&state.pool, id)
        .await?
        .ok_or_else(|| driver_not_found(id).into())
}

pub async fn create(state: &AppState, data: DriverCreate) -> ServiceResult<Driver> {
    validate_driver_fields(Some(&data.name), &data.phone)?;
    let driver = db::drivers::create(&state.pool, &data, shared::util::now_millis()).await?;
    tracing::info!(driver_id = driver.id, name = %driver.name, "Driver created");
    Ok(driver)
}

pub async fn update(state: &AppState, id: i64, data: DriverUpdate) -> ServiceResult<Driver> {
    validate_driver_fields(data.name.as_deref(), &data.phone)?;
    if !db::drivers::update(&state.pool, id, &data, shared::util::now_millis()).await? {
        return Err(driver_not_found(id).into());
    }
    get(state, id).await
}

/// Refused while the driver still has open orders.
pub async fn delete(state: &AppState, id: i64) -> ServiceResult<()> {
    let active = db::orders::count_active_for_driver(&state.pool, id).await?;
    if active > 0 {
        return Err(AppError::with_message(
            ErrorCode::DriverHasActiveOrders,
            format!("Driver {id} still has {active} open orders"),
        )
        .with_detail("active_orders", active)
        .into());
    }
    if !db::drivers::delete(&state.pool, id).await? {
        return Err(driver_not_found(id).into());
    }
    tracing::info!(driver_id = id, "Driver deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_field_validation() {
        assert!(validate_driver_fields(Some("Marco"), &Some("+39 333 1234567".into())).is_ok());
        assert!(validate_driver_fields(None, &None).is_ok());
        assert!(validate_driver_fields(Some("   "), &None).is_err());

        let long_phone = Some("9".repeat(MAX_SHORT_TEXT_LEN + 1));
        let err = validate_driver_fields(None, &long_phone).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
