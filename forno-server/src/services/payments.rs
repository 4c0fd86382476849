//! Card payments: PaymentIntent creation and webhook event handling

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, PaymentMethod, PaymentStatus};
use shared::OrderStatus;

use crate::db;
use crate::error::{BoxError, ServiceError, ServiceResult};
use crate::payment::{self, PaymentIntent};
use crate::state::AppState;

/// Storefront payload for confirming a card payment
#[derive(Debug, Serialize)]
pub struct PaymentSession {
    pub order_id: i64,
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

impl PaymentSession {
    fn new(order_id: i64, intent: PaymentIntent) -> Self {
        Self {
            order_id,
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency,
        }
    }
}

/// What to do with the intent already stored on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredIntent {
    /// Hand the same client secret back
    Reuse,
    /// Money was taken; the webhook will mark the order paid
    AlreadyPaid,
    /// Cancelled or for a different amount
    Replace,
}

pub fn classify_stored_intent(intent: &PaymentIntent, expected_amount: Option<i64>) -> StoredIntent {
    if intent.status == "succeeded" {
        StoredIntent::AlreadyPaid
    } else if intent.is_open() && Some(intent.amount) == expected_amount {
        StoredIntent::Reuse
    } else {
        StoredIntent::Replace
    }
}

fn already_paid(order_id: i64) -> AppError {
    AppError::with_message(ErrorCode::PaymentAlreadyPaid, "Order has already been paid")
        .with_detail("order_id", order_id)
}

fn provider_failure(order_id: i64, e: BoxError) -> ServiceError {
    tracing::error!(order_id, error = %e, "Stripe PaymentIntent request failed");
    ServiceError::App(AppError::new(ErrorCode::PaymentFailed))
}

/// Only open card orders that are not yet paid can start a payment.
pub fn ensure_payable(order: &Order) -> Result<(), AppError> {
    if order.payment_method != PaymentMethod::Card {
        return Err(AppError::with_message(
            ErrorCode::PaymentInvalidMethod,
            "Order is not paid by card",
        )
        .with_detail("order_id", order.id));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::with_message(
            ErrorCode::OrderAlreadyFinalized,
            "Order has been cancelled",
        )
        .with_detail("order_id", order.id));
    }
    match order.payment_status {
        PaymentStatus::Pending | PaymentStatus::Failed => Ok(()),
        PaymentStatus::Paid | PaymentStatus::Refunded => Err(already_paid(order.id)),
    }
}

/// Start (or resume) a card payment.
///
/// An order keeps a single live PaymentIntent: calling this again returns the
/// stored intent while it can still be confirmed, so a customer can never
/// end up paying an intent the order no longer knows about.
pub async fn create_payment(state: &AppState, order_id: i64) -> ServiceResult<PaymentSession> {
    let order = db::orders::find(&state.pool, order_id)
        .await?
        .ok_or_else(|| super::orders::order_not_found(order_id))?;
    ensure_payable(&order)?;

    if let Some(existing) = order.payment_intent_id.as_deref() {
        let intent =
            payment::retrieve_payment_intent(&state.http, &state.stripe_secret_key, existing)
                .await
                .map_err(|e| provider_failure(order_id, e))?;
        match classify_stored_intent(&intent, payment::to_minor_units(order.total)) {
            StoredIntent::Reuse => {
                tracing::info!(order_id, payment_intent_id = %intent.id, "PaymentIntent reused");
                return Ok(PaymentSession::new(order.id, intent));
            }
            StoredIntent::AlreadyPaid => return Err(already_paid(order_id).into()),
            StoredIntent::Replace => {
                tracing::info!(order_id, payment_intent_id = %intent.id, status = %intent.status, "Replacing PaymentIntent");
            }
        }
    }

    let intent = payment::create_payment_intent(
        &state.http,
        &state.stripe_secret_key,
        order.id,
        order.total,
        &state.stripe_currency,
    )
    .await
    .map_err(|e| provider_failure(order_id, e))?;

    let stored = db::orders::set_payment_intent(
        &state.pool,
        order.id,
        order.payment_intent_id.as_deref(),
        &intent.id,
        shared::util::now_millis(),
    )
    .await?;
    if !stored {
        tracing::warn!(order_id, payment_intent_id = %intent.id, "Order payment changed concurrently, new intent discarded");
        return Err(AppError::new(ErrorCode::PaymentInProgress)
            .with_detail("order_id", order_id)
            .into());
    }
    tracing::info!(order_id, payment_intent_id = %intent.id, amount = intent.amount, "PaymentIntent created");

    Ok(PaymentSession::new(order.id, intent))
}

/// Payment status carried by a webhook event type, with the field holding
/// the PaymentIntent id.
pub fn payment_status_for_event(event_type: &str) -> Option<(PaymentStatus, &'static str)> {
    match event_type {
        "payment_intent.succeeded" => Some((PaymentStatus::Paid, "id")),
        "payment_intent.payment_failed" => Some((PaymentStatus::Failed, "id")),
        "charge.refunded" => Some((PaymentStatus::Refunded, "payment_intent")),
        _ => None,
    }
}

/// Order id stamped into the intent metadata at creation
pub fn metadata_order_id(object: &serde_json::Value) -> Option<i64> {
    object["metadata"]["order_id"].as_str()?.parse().ok()
}

/// Apply a verified event. Unknown types and unknown intents are acknowledged.
pub async fn apply_event(state: &AppState, event: &serde_json::Value) -> ServiceResult<()> {
    let event_type = event["type"].as_str().unwrap_or("");
    let Some((status, intent_field)) = payment_status_for_event(event_type) else {
        tracing::debug!(event_type, "Unhandled webhook event type");
        return Ok(());
    };

    let obj = &event["data"]["object"];
    let Some(intent_id) = obj[intent_field].as_str() else {
        tracing::warn!(event_type, "Webhook event without PaymentIntent id");
        return Ok(());
    };
    let now = shared::util::now_millis();

    if let Some(order_id) =
        db::orders::set_payment_status_by_intent(&state.pool, intent_id, status, now).await?
    {
        tracing::info!(order_id, payment_intent_id = intent_id, status = ?status, "Payment status updated");
        return Ok(());
    }

    // A succeeded intent that is no longer stored on its order still paid it
    if status == PaymentStatus::Paid
        && let Some(order_id) = metadata_order_id(obj)
        && db::orders::set_paid_by_order(&state.pool, order_id, intent_id, now).await?
    {
        tracing::warn!(order_id, payment_intent_id = intent_id, "Order paid by a superseded PaymentIntent");
        return Ok(());
    }

    tracing::warn!(payment_intent_id = intent_id, event_type, "No payable order for PaymentIntent event");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::Fulfillment;

    fn card_order() -> Order {
        Order {
            id: 7,
            customer_name: "Anna".into(),
            customer_phone: "123".into(),
            customer_email: None,
            delivery_address: None,
            fulfillment: Fulfillment::Pickup,
            status: OrderStatus::Received,
            subtotal: Decimal::new(1200, 2),
            delivery_fee: Decimal::ZERO,
            total: Decimal::new(1200, 2),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: None,
            driver_id: None,
            delivery_zone_id: None,
            distance_km: None,
            estimated_minutes: None,
            note: None,
            created_at: 0,
            updated_at: 0,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn test_ensure_payable() {
        let mut order = card_order();
        assert!(ensure_payable(&order).is_ok());

        order.payment_status = PaymentStatus::Failed;
        assert!(ensure_payable(&order).is_ok());

        order.payment_status = PaymentStatus::Paid;
        assert_eq!(
            ensure_payable(&order).unwrap_err().code,
            ErrorCode::PaymentAlreadyPaid
        );

        let mut cash = card_order();
        cash.payment_method = PaymentMethod::Cash;
        assert_eq!(
            ensure_payable(&cash).unwrap_err().code,
            ErrorCode::PaymentInvalidMethod
        );

        let mut cancelled = card_order();
        cancelled.status = OrderStatus::Cancelled;
        assert!(ensure_payable(&cancelled).is_err());
    }

    fn intent(status: &str, amount: i64) -> PaymentIntent {
        PaymentIntent {
            id: "pi_1".into(),
            client_secret: "pi_1_secret".into(),
            amount,
            currency: "eur".into(),
            status: status.into(),
        }
    }

    #[test]
    fn test_stored_intent_classification() {
        assert_eq!(
            classify_stored_intent(&intent("requires_payment_method", 1200), Some(1200)),
            StoredIntent::Reuse
        );
        assert_eq!(
            classify_stored_intent(&intent("processing", 1200), Some(1200)),
            StoredIntent::Reuse
        );
        assert_eq!(
            classify_stored_intent(&intent("succeeded", 1200), Some(1200)),
            StoredIntent::AlreadyPaid
        );
        assert_eq!(
            classify_stored_intent(&intent("canceled", 1200), Some(1200)),
            StoredIntent::Replace
        );
        assert_eq!(
            classify_stored_intent(&intent("requires_payment_method", 900), Some(1200)),
            StoredIntent::Replace
        );
    }

    #[test]
    fn test_metadata_order_id() {
        let obj = serde_json::json!({"id": "pi_1", "metadata": {"order_id": "42"}});
        assert_eq!(metadata_order_id(&obj), Some(42));
        assert_eq!(metadata_order_id(&serde_json::json!({"metadata": {}})), None);
        assert_eq!(
            metadata_order_id(&serde_json::json!({"metadata": {"order_id": "x"}})),
            None
        );
    }

    #[test]
    fn test_event_mapping() {
        assert_eq!(
            payment_status_for_event("payment_intent.succeeded"),
            Some((PaymentStatus::Paid, "id"))
        );
        assert_eq!(
            payment_status_for_event("payment_intent.payment_failed"),
            Some((PaymentStatus::Failed, "id"))
        );
        assert_eq!(
            payment_status_for_event("charge.refunded"),
            Some((PaymentStatus::Refunded, "payment_intent"))
        );
        assert_eq!(payment_status_for_event("customer.created"), None);
    }
}
