//! Delivery settings (single row, id = 1)

use shared::models::{DeliverySettings, DeliverySettingsUpdate};

const COLUMNS: &str = "store_latitude, store_longitude, geolocation_enabled, fallback_fee, \
                       fallback_estimated_minutes, minimum_order, updated_at";

pub async fn get(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<DeliverySettings, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM delivery_settings WHERE id = 1"))
        .fetch_one(conn)
        .await
}

pub async fn update(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    data: &DeliverySettingsUpdate,
    now: i64,
) -> Result<DeliverySettings, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE delivery_settings SET
            store_latitude = COALESCE($1, store_latitude),
            store_longitude = COALESCE($2, store_longitude),
            geolocation_enabled = COALESCE($3, geolocation_enabled),
            fallback_fee = COALESCE($4, fallback_fee),
            fallback_estimated_minutes = COALESCE($5, fallback_estimated_minutes),
            minimum_order = COALESCE($6, minimum_order),
            updated_at = $7
        WHERE id = 1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(data.store_latitude)
    .bind(data.store_longitude)
    .bind(data.geolocation_enabled)
    .bind(data.fallback_fee)
    .bind(data.fallback_estimated_minutes)
    .bind(data.minimum_order)
    .bind(now)
    .fetch_one(conn)
    .await
}
