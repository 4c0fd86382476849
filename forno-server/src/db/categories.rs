//! Category database operations

use shared::models::{Category, CategoryCreate, CategoryUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, name, sort_order, is_active, updated_at";

pub async fn list_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM categories ORDER BY sort_order, name"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM categories WHERE is_active ORDER BY sort_order, name"
    ))
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM categories WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    data: &CategoryCreate,
    now: i64,
) -> Result<Category, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO categories (id, name, sort_order, is_active, updated_at)
        VALUES ($1, $2, $3, TRUE, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(super::snowflake_id())
    .bind(data.name.trim())
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &CategoryUpdate,
    now: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE categories SET
            name = COALESCE($1, name),
            sort_order = COALESCE($2, sort_order),
            is_active = COALESCE($3, is_active),
            updated_at = $4
        WHERE id = $5
        RETURNING {COLUMNS}
        "#
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count_products(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
