//! Driver database operations

use shared::models::{Driver, DriverCreate, DriverStatus, DriverUpdate};
use sqlx::PgPool;

/// Driver row with its count of non-terminal orders
const SELECT_WITH_LOAD: &str = r#"
    SELECT d.id, d.name, d.phone, d.status, d.updated_at,
           (SELECT COUNT(*) FROM orders o
            WHERE o.driver_id = d.id
              AND o.status NOT IN ('DELIVERED', 'CANCELLED')) AS active_orders
    FROM drivers d
"#;

pub async fn list(pool: &PgPool) -> Result<Vec<Driver>, sqlx::Error> {
    sqlx::query_as(&format!("{SELECT_WITH_LOAD} ORDER BY d.name"))
        .fetch_all(pool)
        .await
}

pub async fn find(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
) -> Result<Option<Driver>, sqlx::Error> {
    sqlx::query_as(&format!("{SELECT_WITH_LOAD} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn create(pool: &PgPool, data: &DriverCreate, now: i64) -> Result<Driver, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO drivers (id, name, phone, status, updated_at)
        VALUES ($1, $2, $3, 'available', $4)
        RETURNING id, name, phone, status, updated_at
        "#,
    )
    .bind(super::snowflake_id())
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &DriverUpdate,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE drivers SET
            name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            status = COALESCE($3, status),
            updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.phone)
    .bind(data.status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_status(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
    status: DriverStatus,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE drivers SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Back to available once the driver has no open orders left; offline
/// drivers stay offline.
pub async fn release_if_idle(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE drivers SET status = 'available', updated_at = $1
        WHERE id = $2
          AND status = 'busy'
          AND NOT EXISTS (
              SELECT 1 FROM orders
              WHERE driver_id = $2 AND status NOT IN ('DELIVERED', 'CANCELLED')
          )
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
