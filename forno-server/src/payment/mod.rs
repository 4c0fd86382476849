//! Stripe integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sha2::Sha256;

use crate::error::BoxError;

const STRIPE_API: &str = "https://api.stripe.com/v1";

/// Maximum accepted age of a webhook timestamp, seconds
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// PaymentIntent as returned by the Stripe API
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl PaymentIntent {
    /// The intent can still be confirmed by the storefront.
    pub fn is_open(&self) -> bool {
        !matches!(self.status.as_str(), "succeeded" | "canceled")
    }
}

/// Convert a decimal amount to minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Extract a PaymentIntent from a Stripe API response body.
pub fn parse_payment_intent(resp: &serde_json::Value) -> Result<PaymentIntent, BoxError> {
    match (
        resp["id"].as_str(),
        resp["client_secret"].as_str(),
        resp["amount"].as_i64(),
        resp["currency"].as_str(),
    ) {
        (Some(id), Some(secret), Some(amount), Some(currency)) => Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: secret.to_string(),
            amount,
            currency: currency.to_string(),
            status: resp["status"].as_str().unwrap_or_default().to_string(),
        }),
        _ => {
            let message = resp["error"]["message"].as_str().unwrap_or("unexpected response");
            Err(format!("Stripe PaymentIntent request failed: {message}").into())
        }
    }
}

/// Create a PaymentIntent for one order
pub async fn create_payment_intent(
    client: &reqwest::Client,
    secret_key: &str,
    order_id: i64,
    amount: Decimal,
    currency: &str,
) -> Result<PaymentIntent, BoxError> {
    let minor = to_minor_units(amount)
        .filter(|m| *m > 0)
        .ok_or_else(|| format!("Invalid payment amount: {amount}"))?;
    let amount_str = minor.to_string();
    let order_str = order_id.to_string();

    let resp: serde_json::Value = client
        .post(format!("{STRIPE_API}/payment_intents"))
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("amount", amount_str.as_str()),
            ("currency", currency),
            ("metadata[order_id]", order_str.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ])
        .send()
        .await?
        .json()
        .await?;

    parse_payment_intent(&resp)
}

/// Fetch an existing PaymentIntent
pub async fn retrieve_payment_intent(
    client: &reqwest::Client,
    secret_key: &str,
    intent_id: &str,
) -> Result<PaymentIntent, BoxError> {
    let resp: serde_json::Value = client
        .get(format!("{STRIPE_API}/payment_intents/{intent_id}"))
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await?
        .json()
        .await?;

    parse_payment_intent(&resp)
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Stripe sends one v1 entry per active secret during rotation
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });
    if !matched {
        return Err("Webhook signature mismatch");
    }

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

/// Build a `Stripe-Signature` header value (used by tests and local tooling)
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return format!("t={timestamp}"),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}
