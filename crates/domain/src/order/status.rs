//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Legal transitions:
/// ```text
/// PLACED ──► PAID ──► SHIPPED ──► COMPLETED
///    │         │
///    ▼         ▼
/// CANCELED  REFUNDED
/// ```
///
/// COMPLETED, CANCELED and REFUNDED are terminal; no transition function
/// ever moves a status backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created from a cart, awaiting payment.
    #[default]
    Placed,

    /// Payment approved, awaiting shipment.
    Paid,

    /// Seller attached tracking info, package on its way.
    Shipped,

    /// Order fulfilled (terminal).
    Completed,

    /// Buyer canceled before payment (terminal).
    Canceled,

    /// Seller approved a refund after payment (terminal).
    Refunded,
}

impl OrderStatus {
    /// Returns true if a payment may be processed in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if the buyer may cancel in this status.
    ///
    /// Cancellation is legal only before payment; a paid order must go
    /// through the refund workflow instead.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if the seller may ship in this status.
    pub fn can_ship(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if a refund may be requested or approved in this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true if the seller may complete in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Shipped)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Canceled | OrderStatus::Refunded
        )
    }

    /// Returns the status as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    /// Parses a wire string back into a status.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "PLACED" => Some(OrderStatus::Placed),
            "PAID" => Some(OrderStatus::Paid),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELED" => Some(OrderStatus::Canceled),
            "REFUNDED" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
