//! Geocoded address store
//!
//! Rows flagged `dirty` were computed against an outdated zone table or
//! store origin and are re-geocoded on next use.

use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeocodedAddress {
    pub address_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub zone_id: Option<i64>,
    pub dirty: bool,
    pub verified_at: i64,
}

pub async fn find(pool: &PgPool, address_key: &str) -> Result<Option<GeocodedAddress>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT address_key, latitude, longitude, distance_km, zone_id, dirty, verified_at
        FROM geocoded_addresses WHERE address_key = $1
        "#,
    )
    .bind(address_key)
    .fetch_optional(pool)
    .await
}

pub async fn upsert(pool: &PgPool, row: &GeocodedAddress) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO geocoded_addresses (
            address_key, latitude, longitude, distance_km, zone_id, dirty, verified_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (address_key) DO UPDATE SET
            latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude,
            distance_km = EXCLUDED.distance_km, zone_id = EXCLUDED.zone_id,
            dirty = EXCLUDED.dirty, verified_at = EXCLUDED.verified_at
        "#,
    )
    .bind(&row.address_key)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(row.distance_km)
    .bind(row.zone_id)
    .bind(row.dirty)
    .bind(row.verified_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Flag every clean row; returns the number of rows flagged.
pub async fn mark_all_dirty(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE geocoded_addresses SET dirty = TRUE WHERE NOT dirty")
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
