//! Order lifecycle: checkout, tracking, status transitions, driver assignment

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::delivery::DeliveryQuote;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DriverStatus, Fulfillment, Order, OrderCreate, OrderDetail, OrderItemInput, OrderStatusUpdate,
    Product,
};
use shared::OrderStatus;

use crate::db;
use crate::db::orders::{NewOrder, NewOrderItem, OrderFilter};
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::validation::{
    MAX_ADDRESS_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_ORDER_LINES,
    MAX_SHORT_TEXT_LEN, validate_optional_text, validate_quantity, validate_required_text,
};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// One page of the admin order list
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub(crate) fn order_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
        .with_detail("order_id", id)
}

// ── Checkout ──

/// Field checks that need no database access.
pub fn validate_checkout(data: &OrderCreate) -> Result<(), AppError> {
    validate_required_text(&data.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_required_text(&data.customer_phone, "customer_phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&data.customer_email, "customer_email", MAX_EMAIL_LEN)?;
    validate_optional_text(&data.note, "note", MAX_NOTE_LEN)?;

    if data.fulfillment == Fulfillment::Delivery {
        match &data.delivery_address {
            Some(address) => validate_required_text(address, "delivery_address", MAX_ADDRESS_LEN)?,
            None => {
                return Err(
                    AppError::validation("delivery_address is required for delivery orders")
                        .with_detail("field", "delivery_address"),
                );
            }
        }
    }

    if data.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if data.items.len() > MAX_ORDER_LINES {
        return Err(AppError::validation(format!(
            "An order can have at most {MAX_ORDER_LINES} lines"
        )));
    }
    for item in &data.items {
        validate_quantity(item.quantity)?;
        validate_optional_text(&item.note, "item note", MAX_NOTE_LEN)?;
    }
    Ok(())
}

/// Snapshot name and price of each line; every product must exist and be available.
pub fn price_items(
    items: &[OrderItemInput],
    products: &[Product],
) -> Result<(Vec<NewOrderItem>, Decimal), AppError> {
    let by_id: HashMap<i64, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for item in items {
        let product = by_id.get(&item.product_id).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", item.product_id),
            )
            .with_detail("product_id", item.product_id)
        })?;
        if !product.is_available {
            return Err(AppError::with_message(
                ErrorCode::ProductUnavailable,
                format!("{} is currently unavailable", product.name),
            )
            .with_detail("product_id", product.id));
        }
        subtotal += product.price * Decimal::from(item.quantity);
        lines.push(NewOrderItem {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: item.quantity,
            note: item.note.clone(),
        });
    }
    Ok((lines, subtotal))
}

pub fn ensure_minimum(subtotal: Decimal, minimum: Decimal) -> Result<(), AppError> {
    if minimum > Decimal::ZERO && subtotal < minimum {
        return Err(AppError::with_message(
            ErrorCode::OrderBelowMinimum,
            format!("Minimum order is {minimum}, current subtotal is {subtotal}"),
        )
        .with_detail("minimum_order", minimum.to_string())
        .with_detail("subtotal", subtotal.to_string()));
    }
    Ok(())
}

/// Place an order: validate, price, quote, then insert order and items in one
/// transaction.
pub async fn checkout(state: &AppState, data: OrderCreate) -> ServiceResult<OrderDetail> {
    validate_checkout(&data)?;

    let product_ids: Vec<i64> = data.items.iter().map(|i| i.product_id).collect();
    let products = db::products::find_many(&state.pool, &product_ids).await?;
    let (lines, subtotal) = price_items(&data.items, &products)?;

    let settings = super::delivery::settings(state).await?;
    ensure_minimum(subtotal, settings.minimum_order)?;

    let quote = match (data.fulfillment, data.delivery_address.as_deref()) {
        (Fulfillment::Delivery, Some(address)) => {
            super::delivery::quote_for_address(state, address).await?
        }
        _ => DeliveryQuote::pickup(),
    };
    let total = subtotal + quote.fee;
    let now = shared::util::now_millis();

    let new_order = NewOrder {
        id: shared::util::snowflake_id(),
        customer_name: data.customer_name.trim(),
        customer_phone: data.customer_phone.trim(),
        customer_email: data.customer_email.as_deref().map(str::trim),
        delivery_address: match data.fulfillment {
            Fulfillment::Delivery => data.delivery_address.as_deref().map(str::trim),
            Fulfillment::Pickup => None,
        },
        fulfillment: data.fulfillment,
        subtotal,
        delivery_fee: quote.fee,
        total,
        payment_method: data.payment_method,
        delivery_zone_id: quote.zone_id,
        distance_km: quote.distance_km,
        estimated_minutes: (data.fulfillment == Fulfillment::Delivery)
            .then_some(quote.estimated_minutes),
        note: data.note.as_deref(),
        now,
    };

    let (order, items) = db::orders::create_with_items(&state.pool, &new_order, &lines).await?;

    tracing::info!(
        order_id = order.id,
        total = %order.total,
        fulfillment = ?order.fulfillment,
        quote_source = ?quote.source,
        "Order placed"
    );

    Ok(OrderDetail {
        order,
        items,
        history: Vec::new(),
    })
}

// ── Reads ──

pub async fn detail(state: &AppState, id: i64) -> ServiceResult<OrderDetail> {
    let order = db::orders::find(&state.pool, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    let items = db::orders::items(&state.pool, id).await?;
    let history = db::orders::history(&state.pool, id).await?;
    Ok(OrderDetail {
        order,
        items,
        history,
    })
}

pub async fn list(state: &AppState, mut filter: OrderFilter) -> ServiceResult<OrderPage> {
    filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
    filter.offset = filter.offset.max(0);
    let orders = db::orders::list(&state.pool, &filter).await?;
    let total = db::orders::count(&state.pool, &filter).await?;
    Ok(OrderPage {
        orders,
        total,
        limit: filter.limit,
        offset: filter.offset,
    })
}

// ── Transitions ──

/// Move an order to a new status.
///
/// The row is locked for the duration of the transaction, so concurrent
/// updates are checked against the committed status.
pub async fn update_status(
    state: &AppState,
    id: i64,
    data: OrderStatusUpdate,
) -> ServiceResult<Order> {
    let next = OrderStatus::parse(&data.status)?;
    validate_optional_text(&data.note, "note", MAX_NOTE_LEN)?;
    let note = data.note.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let mut tx = state.pool.begin().await?;
    let current = db::orders::find_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;

    current.status.validate_transition(next)?;

    let now = shared::util::now_millis();
    let order = db::orders::set_status(&mut *tx, id, next, now).await?;

    if state.order_history_enabled {
        db::orders::insert_history(&mut *tx, id, current.status, next, note, now).await?;
    }

    if next.is_terminal()
        && let Some(driver_id) = order.driver_id
        && db::drivers::release_if_idle(&mut *tx, driver_id, now).await?
    {
        tracing::info!(driver_id, "Driver released");
    }

    tx.commit().await?;

    tracing::info!(
        order_id = id,
        from = %current.status,
        to = %next,
        "Order status changed"
    );
    Ok(order)
}

/// Attach a driver to an open delivery order and mark the driver busy.
pub async fn assign_driver(state: &AppState, id: i64, driver_id: i64) -> ServiceResult<Order> {
    let mut tx = state.pool.begin().await?;
    let current = db::orders::find_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;

    if current.status.is_terminal() {
        return Err(AppError::with_message(
            ErrorCode::OrderAlreadyFinalized,
            format!("Order {id} is already {}", current.status),
        )
        .into());
    }
    if current.fulfillment != Fulfillment::Delivery {
        return Err(AppError::business_rule("Only delivery orders can be assigned a driver")
            .with_detail("order_id", id)
            .into());
    }

    let driver = db::drivers::find(&mut *tx, driver_id).await?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::DriverNotFound,
            format!("Driver {driver_id} not found"),
        )
        .with_detail("driver_id", driver_id)
    })?;
    if driver.status == DriverStatus::Offline {
        return Err(AppError::with_message(
            ErrorCode::DriverUnavailable,
            format!("Driver {} is offline", driver.name),
        )
        .with_detail("driver_id", driver_id)
        .into());
    }

    let now = shared::util::now_millis();
    let previous_driver = current.driver_id.filter(|prev| *prev != driver_id);
    let order = db::orders::set_driver(&mut *tx, id, driver_id, now).await?;
    db::drivers::set_status(&mut *tx, driver_id, DriverStatus::Busy, now).await?;
    if let Some(prev) = previous_driver {
        db::drivers::release_if_idle(&mut *tx, prev, now).await?;
    }
    tx.commit().await?;

    tracing::info!(order_id = id, driver_id, "Driver assigned");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PaymentMethod;

    fn product(id: i64, cents: i64, available: bool) -> Product {
        Product {
            id,
            category_id: 1,
            name: format!("Pizza {id}"),
            description: None,
            price: Decimal::new(cents, 2),
            image_url: None,
            sort_order: 0,
            is_available: available,
            updated_at: 0,
        }
    }

    fn item(product_id: i64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            note: None,
        }
    }

    fn order(items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            customer_name: "Mario Rossi".into(),
            customer_phone: "+39 333 1234567".into(),
            customer_email: None,
            delivery_address: Some("Via Roma 1, Milano".into()),
            fulfillment: Fulfillment::Delivery,
            payment_method: PaymentMethod::Cash,
            note: None,
            items,
        }
    }

    #[test]
    fn test_price_items_snapshots_and_sums() {
        let products = vec![product(1, 750, true), product(2, 900, true)];
        let (lines, subtotal) = price_items(&[item(1, 2), item(2, 1)], &products).unwrap();
        assert_eq!(subtotal, Decimal::new(2400, 2));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Pizza 1");
        assert_eq!(lines[0].unit_price, Decimal::new(750, 2));
    }

    #[test]
    fn test_price_items_rejects_unknown_and_unavailable() {
        let products = vec![product(1, 750, true), product(2, 900, false)];
        let err = price_items(&[item(3, 1)], &products).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
        let err = price_items(&[item(2, 1)], &products).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductUnavailable);
    }

    #[test]
    fn test_validate_checkout() {
        assert!(validate_checkout(&order(vec![item(1, 1)])).is_ok());

        let err = validate_checkout(&order(vec![])).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);

        let err = validate_checkout(&order(vec![item(1, 51)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut no_address = order(vec![item(1, 1)]);
        no_address.delivery_address = None;
        assert!(validate_checkout(&no_address).is_err());

        no_address.fulfillment = Fulfillment::Pickup;
        assert!(validate_checkout(&no_address).is_ok());
    }

    #[test]
    fn test_minimum_order() {
        let ten = Decimal::new(1000, 2);
        assert!(ensure_minimum(Decimal::new(999, 2), Decimal::ZERO).is_ok());
        assert!(ensure_minimum(ten, ten).is_ok());
        let err = ensure_minimum(Decimal::new(999, 2), ten).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderBelowMinimum);
    }
}
