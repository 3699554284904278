//! Domain error types.

use common::ErrorKind;
use thiserror::Error;

use crate::order::OrderStatus;
use crate::payment::PaymentStatus;

/// Errors raised by aggregate guards.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Order is not in the required source state for a transition.
    #[error("cannot {action} order in {current_status} state")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Payment is not in the required source state for a transition.
    #[error("cannot {action} payment in {current_status} state")]
    InvalidPaymentTransition {
        current_status: PaymentStatus,
        action: &'static str,
    },

    /// Quantity must be at least 1.
    #[error("invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Price must not be negative.
    #[error("invalid price: {price} (must not be negative)")]
    InvalidPrice { price: i64 },

    /// An order must own at least one line.
    #[error("order has no lines")]
    NoLines,

    /// A refund was already requested for this order.
    #[error("refund already requested")]
    RefundAlreadyRequested,

    /// Refund approval requires a prior buyer request.
    #[error("refund has not been requested")]
    RefundNotRequested,
}

impl DomainError {
    /// Returns the machine-readable kind of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidQuantity { .. }
            | DomainError::InvalidPrice { .. }
            | DomainError::NoLines => ErrorKind::InvalidInput,
            DomainError::InvalidStateTransition { .. }
            | DomainError::InvalidPaymentTransition { .. }
            | DomainError::RefundAlreadyRequested
            | DomainError::RefundNotRequested => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_names_current_state() {
        let err = DomainError::InvalidStateTransition {
            current_status: OrderStatus::Paid,
            action: "cancel",
        };
        assert!(err.to_string().contains("PAID"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn input_errors_map_to_invalid_input() {
        assert_eq!(
            DomainError::InvalidQuantity { quantity: 0 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            DomainError::InvalidPrice { price: -1 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(DomainError::NoLines.kind(), ErrorKind::InvalidInput);
    }
}
