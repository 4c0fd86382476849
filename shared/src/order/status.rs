//! Order status state machine
//!
//! ```text
//! RECEIVED ──► PREPARING ──► ON_THE_WAY ──► DELIVERED
//!     │            │              │
//!     └────────────┴──────────────┴──────► CANCELLED
//! ```
//!
//! Orders only move forward along the sequence. Forward moves may skip steps
//! (pickup orders go straight from PREPARING to DELIVERED). CANCELLED is
//! reachable from every non-terminal state. DELIVERED and CANCELLED are
//! terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum OrderStatus {
    #[default]
    Received,
    Preparing,
    OnTheWay,
    Delivered,
    Cancelled,
}

/// Reason a status change was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("order is already {0} and can no longer change")]
    AlreadyFinalized(OrderStatus),
    #[error("order is already {0}")]
    Unchanged(OrderStatus),
    #[error("cannot move order from {from} back to {to}")]
    Regression { from: OrderStatus, to: OrderStatus },
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        let code = match e {
            TransitionError::AlreadyFinalized(_) => ErrorCode::OrderAlreadyFinalized,
            TransitionError::Unchanged(_) | TransitionError::Regression { .. } => {
                ErrorCode::OrderStatusRegression
            }
        };
        AppError::with_message(code, e.to_string())
    }
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Received,
        OrderStatus::Preparing,
        OrderStatus::OnTheWay,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "RECEIVED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OnTheWay => "ON_THE_WAY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse a status received from a client.
    ///
    /// Unknown values are a validation error (400), not a business-rule error.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        value.parse()
    }

    /// Position along the forward sequence. CANCELLED sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Received => Some(0),
            OrderStatus::Preparing => Some(1),
            OrderStatus::OnTheWay => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Check whether `self -> next` is allowed.
    pub fn validate_transition(self, next: OrderStatus) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyFinalized(self));
        }
        if self == next {
            return Err(TransitionError::Unchanged(self));
        }
        match (self.rank(), next.rank()) {
            (_, None) => Ok(()),
            (Some(from), Some(to)) if to > from => Ok(()),
            _ => Err(TransitionError::Regression {
                from: self,
                to: next,
            }),
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.validate_transition(next).is_ok()
    }

    /// Statuses an order in `self` may move to next.
    pub fn next_statuses(self) -> Vec<OrderStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| self.can_transition_to(*s))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderInvalidStatus,
                    format!("Invalid order status: {s}"),
                )
                .with_detail("allowed", Self::ALL.map(|s| s.as_str()).to_vec())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Received.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(OnTheWay));
        assert!(OnTheWay.can_transition_to(Delivered));
        // skipping ahead is still forward
        assert!(Received.can_transition_to(Delivered));
        assert!(Preparing.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for from in [Received, Preparing, OnTheWay] {
            assert!(from.can_transition_to(Cancelled), "{from} -> CANCELLED");
        }
    }

    #[test]
    fn test_regressions_rejected() {
        assert_eq!(
            OnTheWay.validate_transition(Preparing),
            Err(TransitionError::Regression {
                from: OnTheWay,
                to: Preparing
            })
        );
        assert!(!Preparing.can_transition_to(Received));
        assert!(!OnTheWay.can_transition_to(Received));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for to in OrderStatus::ALL {
            assert_eq!(
                Delivered.validate_transition(to),
                Err(TransitionError::AlreadyFinalized(Delivered))
            );
            assert_eq!(
                Cancelled.validate_transition(to),
                Err(TransitionError::AlreadyFinalized(Cancelled))
            );
        }
    }

    #[test]
    fn test_same_status_rejected() {
        assert_eq!(
            Preparing.validate_transition(Preparing),
            Err(TransitionError::Unchanged(Preparing))
        );
    }

    #[test]
    fn test_never_regresses_except_to_cancelled() {
        for from in OrderStatus::ALL {
            for to in from.next_statuses() {
                if to == Cancelled {
                    continue;
                }
                assert!(to.rank() > from.rank(), "{from} -> {to} went backwards");
            }
        }
    }

    #[test]
    fn test_next_statuses() {
        assert_eq!(
            Received.next_statuses(),
            vec![Preparing, OnTheWay, Delivered, Cancelled]
        );
        assert_eq!(OnTheWay.next_statuses(), vec![Delivered, Cancelled]);
        assert!(Delivered.next_statuses().is_empty());
    }

    #[test]
    fn test_parse() {
        assert_eq!(OrderStatus::parse("ON_THE_WAY").unwrap(), OnTheWay);
        assert_eq!(OrderStatus::parse(" delivered ").unwrap(), Delivered);

        let err = OrderStatus::parse("BAKING").unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidStatus);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_transition_error_maps_to_business_rule() {
        let err: AppError = OnTheWay.validate_transition(Received).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::OrderStatusRegression);
        assert_eq!(err.http_status(), http::StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = Cancelled.validate_transition(Delivered).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::OrderAlreadyFinalized);
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        assert_eq!(serde_json::to_string(&OnTheWay).unwrap(), "\"ON_THE_WAY\"");
        let s: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(s, Cancelled);
    }
}
