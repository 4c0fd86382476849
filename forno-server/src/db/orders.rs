//! Order database operations

use rust_decimal::Decimal;
use shared::OrderStatus;
use shared::models::{
    Fulfillment, Order, OrderItem, OrderStatusHistory, PaymentMethod, PaymentStatus,
};
use sqlx::PgPool;

const COLUMNS: &str = r#"
    id, customer_name, customer_phone, customer_email, delivery_address, fulfillment,
    status, subtotal, delivery_fee, total, payment_method, payment_status,
    payment_intent_id, driver_id, delivery_zone_id, distance_km, estimated_minutes,
    note, created_at, updated_at, delivered_at, cancelled_at
"#;

/// Order row as computed at checkout
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub id: i64,
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub customer_email: Option<&'a str>,
    pub delivery_address: Option<&'a str>,
    pub fulfillment: Fulfillment,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub delivery_zone_id: Option<i64>,
    pub distance_km: Option<f64>,
    pub estimated_minutes: Option<i32>,
    pub note: Option<&'a str>,
    pub now: i64,
}

/// Price/name snapshot of one checkout line
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Admin list filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub driver_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    order: &NewOrder<'_>,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO orders (
            id, customer_name, customer_phone, customer_email, delivery_address,
            fulfillment, status, subtotal, delivery_fee, total, payment_method,
            payment_status, delivery_zone_id, distance_km, estimated_minutes, note,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'RECEIVED', $7, $8, $9, $10, 'pending',
                $11, $12, $13, $14, $15, $15)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(order.id)
    .bind(order.customer_name)
    .bind(order.customer_phone)
    .bind(order.customer_email)
    .bind(order.delivery_address)
    .bind(order.fulfillment)
    .bind(order.subtotal)
    .bind(order.delivery_fee)
    .bind(order.total)
    .bind(order.payment_method)
    .bind(order.delivery_zone_id)
    .bind(order.distance_km)
    .bind(order.estimated_minutes)
    .bind(order.note)
    .bind(order.now)
    .fetch_one(conn)
    .await
}

/// Batch insert via UNNEST; one round trip for all lines.
pub async fn insert_items(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    order_id: i64,
    items: &[NewOrderItem],
) -> Result<Vec<OrderItem>, sqlx::Error> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = items.iter().map(|_| super::snowflake_id()).collect();
    let order_ids: Vec<i64> = items.iter().map(|_| order_id).collect();
    let product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    let prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();
    let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
    let notes: Vec<Option<&str>> = items.iter().map(|i| i.note.as_deref()).collect();

    sqlx::query_as(
        r#"
        INSERT INTO order_items (id, order_id, product_id, name, unit_price, quantity, note)
        SELECT * FROM UNNEST(
            $1::BIGINT[], $2::BIGINT[], $3::BIGINT[], $4::TEXT[],
            $5::NUMERIC[], $6::INTEGER[], $7::TEXT[]
        )
        RETURNING id, order_id, product_id, name, unit_price, quantity, note
        "#,
    )
    .bind(&ids)
    .bind(&order_ids)
    .bind(&product_ids)
    .bind(&names)
    .bind(&prices)
    .bind(&quantities)
    .bind(&notes)
    .fetch_all(conn)
    .await
}

/// Insert an order and its lines in one transaction; nothing is kept if any
/// line fails.
pub async fn create_with_items(
    pool: &PgPool,
    order: &NewOrder<'_>,
    items: &[NewOrderItem],
) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let created = insert(&mut *tx, order).await?;
    let lines = insert_items(&mut *tx, created.id, items).await?;
    tx.commit().await?;
    Ok((created, lines))
}

pub async fn find(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Row-locked read; must run inside a transaction.
pub async fn find_for_update(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, order_id, product_id, name, unit_price, quantity, note
        FROM order_items WHERE order_id = $1 ORDER BY id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn history(
    pool: &PgPool,
    order_id: i64,
) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, order_id, from_status, to_status, note, changed_at
        FROM order_status_history WHERE order_id = $1 ORDER BY changed_at, id
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
}

pub async fn list(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        SELECT {COLUMNS} FROM orders
        WHERE ($1::order_status IS NULL OR status = $1)
          AND ($2::BIGINT IS NULL OR driver_id = $2)
        ORDER BY created_at DESC, id DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(filter.status)
    .bind(filter.driver_id)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &OrderFilter) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM orders
        WHERE ($1::order_status IS NULL OR status = $1)
          AND ($2::BIGINT IS NULL OR driver_id = $2)
        "#,
    )
    .bind(filter.status)
    .bind(filter.driver_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}

/// Set the status and stamp the matching terminal timestamp.
pub async fn set_status(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> Result<Order, sqlx::Error> {
    let delivered_at = (status == OrderStatus::Delivered).then_some(now);
    let cancelled_at = (status == OrderStatus::Cancelled).then_some(now);
    sqlx::query_as(&format!(
        r#"
        UPDATE orders SET
            status = $1,
            updated_at = $2,
            delivered_at = COALESCE($3, delivered_at),
            cancelled_at = COALESCE($4, cancelled_at)
        WHERE id = $5
        RETURNING {COLUMNS}
        "#
    ))
    .bind(status)
    .bind(now)
    .bind(delivered_at)
    .bind(cancelled_at)
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn insert_history(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    note: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (id, order_id, from_status, to_status, note, changed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(super::snowflake_id())
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(note)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_driver(
    conn: impl sqlx::Executor<'_, Database = sqlx::Postgres>,
    id: i64,
    driver_id: i64,
    now: i64,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE orders SET driver_id = $1, updated_at = $2 WHERE id = $3 RETURNING {COLUMNS}"
    ))
    .bind(driver_id)
    .bind(now)
    .bind(id)
    .fetch_one(conn)
    .await
}

/// Store a new intent on an unpaid order.
///
/// Only succeeds while the stored intent is still `previous`, so two
/// concurrent payment starts cannot silently replace each other.
pub async fn set_payment_intent(
    pool: &PgPool,
    id: i64,
    previous: Option<&str>,
    intent_id: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET payment_intent_id = $1, payment_status = 'pending', updated_at = $2
        WHERE id = $3
          AND payment_status IN ('pending', 'failed')
          AND payment_intent_id IS NOT DISTINCT FROM $4
        "#,
    )
    .bind(intent_id)
    .bind(now)
    .bind(id)
    .bind(previous)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Update the payment status of the order owning `intent_id`.
///
/// Provider events may arrive out of order: a refunded order never changes
/// again and a paid order never becomes failed. Returns the order id when a
/// row changed.
pub async fn set_payment_status_by_intent(
    pool: &PgPool,
    intent_id: &str,
    status: PaymentStatus,
    now: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE orders SET payment_status = $1, updated_at = $2
        WHERE payment_intent_id = $3
          AND payment_status <> 'refunded'
          AND NOT (payment_status = 'paid' AND $1::payment_status = 'failed')
        RETURNING id
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(intent_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

/// Mark an unpaid card order paid by `intent_id`, recording that intent.
///
/// Used when a successful intent is no longer the one stored on the order.
pub async fn set_paid_by_order(
    pool: &PgPool,
    id: i64,
    intent_id: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET payment_status = 'paid', payment_intent_id = $1, updated_at = $2
        WHERE id = $3
          AND payment_method = 'card'
          AND payment_status IN ('pending', 'failed')
        "#,
    )
    .bind(intent_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_active_for_driver(pool: &PgPool, driver_id: i64) -> Result<i64, sqlx::Error> {
    let (n,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM orders
        WHERE driver_id = $1 AND status NOT IN ('DELIVERED', 'CANCELLED')
        "#,
    )
    .bind(driver_id)
    .fetch_one(pool)
    .await?;
    Ok(n)
}
