//! Product database operations

use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::PgPool;

const COLUMNS: &str =
    "id, category_id, name, description, price, image_url, sort_order, is_available, updated_at";

pub async fn list_all(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM products ORDER BY category_id, sort_order, name"
    ))
    .fetch_all(pool)
    .await
}

/// Available products of active categories (storefront menu)
pub async fn list_on_menu(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.id, p.category_id, p.name, p.description, p.price, p.image_url,
               p.sort_order, p.is_available, p.updated_at
        FROM products p
        JOIN categories c ON c.id = p.category_id
        WHERE p.is_available AND c.is_active
        ORDER BY p.sort_order, p.name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_many(pool: &PgPool, ids: &[i64]) -> Result<Vec<Product>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM products WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    data: &ProductCreate,
    now: i64,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO products (
            id, category_id, name, description, price, image_url,
            sort_order, is_available, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(super::snowflake_id())
    .bind(data.category_id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.sort_order.unwrap_or(0))
    .bind(data.is_available.unwrap_or(true))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &ProductUpdate,
    now: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE products SET
            category_id = COALESCE($1, category_id),
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            image_url = COALESCE($5, image_url),
            sort_order = COALESCE($6, sort_order),
            is_available = COALESCE($7, is_available),
            updated_at = $8
        WHERE id = $9
        RETURNING {COLUMNS}
        "#
    ))
    .bind(data.category_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(&data.image_url)
    .bind(data.sort_order)
    .bind(data.is_available)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
