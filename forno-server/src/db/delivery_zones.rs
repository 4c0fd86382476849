//! Delivery zone database operations

use shared::models::{DeliveryZone, DeliveryZoneCreate};
use sqlx::PgPool;

const COLUMNS: &str =
    "id, name, min_distance_km, max_distance_km, fee, estimated_minutes, is_active, updated_at";

pub async fn list_all(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<Vec<DeliveryZone>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM delivery_zones ORDER BY min_distance_km, name"
    ))
    .fetch_all(conn)
    .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<DeliveryZone>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM delivery_zones WHERE is_active ORDER BY min_distance_km"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
) -> Result<Option<DeliveryZone>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM delivery_zones WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Serialize zone writes so the overlap check and the write see the same rows.
pub async fn lock_for_write(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<(), sqlx::Error> {
    sqlx::query("LOCK TABLE delivery_zones IN SHARE ROW EXCLUSIVE MODE")
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    data: &DeliveryZoneCreate,
    now: i64,
) -> Result<DeliveryZone, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO delivery_zones (
            id, name, min_distance_km, max_distance_km, fee,
            estimated_minutes, is_active, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(super::snowflake_id())
    .bind(data.name.trim())
    .bind(data.min_distance_km)
    .bind(data.max_distance_km)
    .bind(data.fee)
    .bind(data.estimated_minutes)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Overwrite every mutable column with the already-merged zone.
pub async fn save(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    zone: &DeliveryZone,
) -> Result<DeliveryZone, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE delivery_zones SET
            name = $1, min_distance_km = $2, max_distance_km = $3, fee = $4,
            estimated_minutes = $5, is_active = $6, updated_at = $7
        WHERE id = $8
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&zone.name)
    .bind(zone.min_distance_km)
    .bind(zone.max_distance_km)
    .bind(zone.fee)
    .bind(zone.estimated_minutes)
    .bind(zone.is_active)
    .bind(zone.updated_at)
    .bind(zone.id)
    .fetch_one(conn)
    .await
}

pub async fn delete(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM delivery_zones WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
