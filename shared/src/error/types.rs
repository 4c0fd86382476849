//! `AppError` and the JSON envelope every error (and bare acknowledgement)
//! is sent in

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Structured context attached to an error, e.g. `conflicting_zone_id`
/// on a zone overlap or `field` on a validation failure.
pub type ErrorDetails = HashMap<String, Value>;

/// An error the storefront or back office can act on.
///
/// The code decides the HTTP status; the message is shown to people; the
/// details carry ids and field names for clients that want them.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref()?.get(key)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Infrastructure failures; these are logged when turned into a response.
    pub fn is_system(&self) -> bool {
        self.code.category() == ErrorCategory::System
    }

    /// Malformed or out-of-range input (400)
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Well-formed request the current state does not allow (422), such as a
    /// status change that repeats the current status.
    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::BusinessRule, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    /// Same answer for unknown user and wrong password
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Body of error responses and of endpoints that only acknowledge a write
/// (deletes, cache flushes). Reads return their resource directly.
///
/// `code` is 0 on success, otherwise the numeric [`ErrorCode`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = ()> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code.is_none_or(|c| c == 0)
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.is_system() {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }
        (self.http_status(), axum::Json(ApiResponse::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
        assert!(!err.is_system());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::with_message(ErrorCode::ZoneOverlap, "Overlaps zone 'Centro'")
            .with_detail("conflicting_zone_id", 42)
            .with_detail("conflicting_zone_name", "Centro");

        assert_eq!(err.detail("conflicting_zone_id").unwrap(), 42);
        assert_eq!(err.detail("conflicting_zone_name").unwrap(), "Centro");
        assert!(err.detail("missing").is_none());
        assert!(AppError::not_authenticated().detail("field").is_none());
    }

    #[test]
    fn test_constructor_statuses() {
        let err = AppError::not_found("Driver 7");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Driver 7 not found");
        assert_eq!(err.detail("resource").unwrap(), "Driver 7");

        assert_eq!(AppError::validation("bad").http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::business_rule("no").http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::not_authenticated().http_status(), StatusCode::UNAUTHORIZED);
        assert!(AppError::new(ErrorCode::InternalError).is_system());
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "Order 12 not found");
        assert_eq!(err.to_string(), "Order 12 not found");
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::with_message(ErrorCode::DriverHasActiveOrders, "Driver 3 is busy")
            .with_detail("active_orders", 2);
        let body = serde_json::to_value(ApiResponse::error(&err)).unwrap();

        assert_eq!(body["code"], 7003);
        assert_eq!(body["message"], "Driver 3 is busy");
        assert_eq!(body["details"]["active_orders"], 2);
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_ok_envelope() {
        let ok = ApiResponse::ok();
        assert!(ok.is_success());
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"code":0,"message":"OK"}"#);

        let parsed: ApiResponse =
            serde_json::from_str(r#"{"code":6001,"message":"Delivery zone not found"}"#)
                .unwrap();
        assert!(!parsed.is_success());
    }
}
