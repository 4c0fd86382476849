//! Unified error codes for Forno
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Catalog errors (products, categories)
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Delivery errors (zones, geolocation)
//! - 7xxx: Driver errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Business rule violated
    BusinessRule = 6,
    /// Too many requests
    RateLimited = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Catalog ====================
    /// Product not found
    ProductNotFound = 3001,
    /// Product is not available for ordering
    ProductUnavailable = 3002,
    /// Category not found
    CategoryNotFound = 3101,
    /// Category still has products
    CategoryHasProducts = 3102,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Order status value is not recognized
    OrderInvalidStatus = 4003,
    /// Status change would move the order backwards
    OrderStatusRegression = 4004,
    /// Order is already delivered or cancelled
    OrderAlreadyFinalized = 4005,
    /// Order total is below the configured minimum
    OrderBelowMinimum = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment provider call failed
    PaymentFailed = 5001,
    /// Order has already been paid
    PaymentAlreadyPaid = 5002,
    /// Payment method does not support this operation
    PaymentInvalidMethod = 5003,
    /// Webhook signature did not verify
    WebhookSignatureInvalid = 5004,
    /// Another payment start changed the order first
    PaymentInProgress = 5005,

    // ==================== 6xxx: Delivery ====================
    /// Delivery zone not found
    ZoneNotFound = 6001,
    /// Delivery zone overlaps an active zone
    ZoneOverlap = 6002,
    /// Address could not be geocoded
    GeocodingFailed = 6101,

    // ==================== 7xxx: Driver ====================
    /// Driver not found
    DriverNotFound = 7001,
    /// Driver is offline
    DriverUnavailable = 7002,
    /// Driver still has active orders
    DriverHasActiveOrders = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::BusinessRule => "Business rule violation",
            ErrorCode::RateLimited => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Catalog
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductUnavailable => "Product is not available",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasProducts => "Category has associated products",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderInvalidStatus => "Invalid order status",
            ErrorCode::OrderStatusRegression => "Order status cannot move backwards",
            ErrorCode::OrderAlreadyFinalized => "Order is already delivered or cancelled",
            ErrorCode::OrderBelowMinimum => "Order total is below the minimum order amount",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::PaymentAlreadyPaid => "Order has already been paid",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",
            ErrorCode::PaymentInProgress => "A payment is already being started for this order",

            // Delivery
            ErrorCode::ZoneNotFound => "Delivery zone not found",
            ErrorCode::ZoneOverlap => "Delivery zone overlaps an active zone",
            ErrorCode::GeocodingFailed => "Address could not be geocoded",

            // Driver
            ErrorCode::DriverNotFound => "Driver not found",
            ErrorCode::DriverUnavailable => "Driver is offline",
            ErrorCode::DriverHasActiveOrders => "Driver has active orders",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::BusinessRule),
            7 => Ok(ErrorCode::RateLimited),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Catalog
            3001 => Ok(ErrorCode::ProductNotFound),
            3002 => Ok(ErrorCode::ProductUnavailable),
            3101 => Ok(ErrorCode::CategoryNotFound),
            3102 => Ok(ErrorCode::CategoryHasProducts),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderInvalidStatus),
            4004 => Ok(ErrorCode::OrderStatusRegression),
            4005 => Ok(ErrorCode::OrderAlreadyFinalized),
            4006 => Ok(ErrorCode::OrderBelowMinimum),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::PaymentAlreadyPaid),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5004 => Ok(ErrorCode::WebhookSignatureInvalid),
            5005 => Ok(ErrorCode::PaymentInProgress),

            // Delivery
            6001 => Ok(ErrorCode::ZoneNotFound),
            6002 => Ok(ErrorCode::ZoneOverlap),
            6101 => Ok(ErrorCode::GeocodingFailed),

            // Driver
            7001 => Ok(ErrorCode::DriverNotFound),
            7002 => Ok(ErrorCode::DriverUnavailable),
            7003 => Ok(ErrorCode::DriverHasActiveOrders),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
