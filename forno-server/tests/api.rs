//! Router-level tests that never reach the database.
//!
//! The pool is created lazily, so any request that would touch PostgreSQL
//! is kept out of here.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use forno_server::auth::admin_auth::create_token;
use forno_server::payment::sign_webhook_payload;
use forno_server::{AppState, Config, api};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

mod common;

use common::{JWT_SECRET, WEBHOOK_SECRET, test_config};

fn test_app() -> (Router, AppState) {
    app_with(test_config())
}

fn app_with(config: Config) -> (Router, AppState) {
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    let state = AppState::with_pool(&config, pool).unwrap();
    (api::create_router(state.clone()), state)
}

fn admin_token() -> String {
    create_token(1, "chef", JWT_SECRET).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "forno-server");
}

#[tokio::test]
async fn webhook_without_signature_is_rejected() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::post("/api/payments/webhook")
                .body(Body::from(r#"{"id":"evt_1","type":"payment_intent.succeeded"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_with_wrong_secret_is_rejected() {
    let (app, _) = test_app();
    let payload = r#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
    let header_value = sign_webhook_payload(
        payload.as_bytes(),
        "whsec_other",
        shared::util::now_millis() / 1000,
    );
    let response = app
        .oneshot(
            Request::post("/api/payments/webhook")
                .header("stripe-signature", header_value)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_signed_but_without_event_id_is_rejected() {
    let (app, _) = test_app();
    let payload = r#"{"type":"payment_intent.succeeded"}"#;
    let header_value = sign_webhook_payload(
        payload.as_bytes(),
        WEBHOOK_SECRET,
        shared::util::now_millis() / 1000,
    );
    let response = app
        .oneshot(
            Request::post("/api/payments/webhook")
                .header("stripe-signature", header_value)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let (app, _) = test_app();
    for uri in ["/api/admin/orders", "/api/admin/cache", "/api/admin/me"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn admin_rejects_tokens_signed_with_another_secret() {
    let (app, _) = test_app();
    let token = create_token(1, "chef", "another-secret").unwrap();
    let response = app
        .oneshot(
            Request::get("/api/admin/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_me_returns_identity() {
    let (app, _) = test_app();
    let response = app
        .oneshot(
            Request::get("/api/admin/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "chef");
}

#[tokio::test]
async fn cache_admin_endpoints() {
    let (app, state) = test_app();
    state
        .cache
        .set_default("menu", serde_json::json!([]));
    state
        .cache
        .set_default("products:7", serde_json::json!({"id": 7}));
    let auth = format!("Bearer {}", admin_token());

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/cache/keys")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/admin/cache/invalidate")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"pattern":"^products:.*$"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/admin/cache/invalidate")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"pattern":"(unclosed"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::delete("/api/admin/cache")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed"], 1);
    assert_eq!(state.cache.stats().entries, 0);
}

fn login_attempt(peer: [u8; 4], forwarded: &str) -> Request<Body> {
    // Malformed JSON is rejected by the extractor, after the limiter counted it
    let mut request = Request::post("/api/admin/login")
        .header("x-forwarded-for", forwarded)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{"))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 51000))));
    request
}

#[tokio::test]
async fn login_limit_ignores_rotated_forwarded_header() {
    let (app, _) = test_app();
    let mut statuses = Vec::new();
    for i in 0..6 {
        let forwarded = format!("203.0.113.{i}");
        let response = app
            .clone()
            .oneshot(login_attempt([198, 51, 100, 20], &forwarded))
            .await
            .unwrap();
        statuses.push(response.status());
    }
    assert!(statuses[..5].iter().all(|s| *s != StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn login_limit_behind_proxy_keys_on_forwarded_client() {
    let (app, _) = app_with(Config {
        trust_proxy: true,
        ..test_config()
    });
    let proxy = [10, 0, 0, 2];
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(login_attempt(proxy, "203.0.113.9"))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
    let limited = app
        .clone()
        .oneshot(login_attempt(proxy, "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another client through the same proxy has its own window
    let other = app
        .oneshot(login_attempt(proxy, "203.0.113.10"))
        .await
        .unwrap();
    assert_ne!(other.status(), StatusCode::TOO_MANY_REQUESTS);
}
