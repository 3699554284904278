//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{BuyerId, Money, OrderId, SellerId};

use crate::error::DomainError;

use super::{Contact, OrderLine, OrderStatus, Receiver};

/// Seller-scoped order aggregate.
///
/// Created once from a validated cart and driven through the status state
/// machine. The order exclusively owns its lines; buyer, seller and receiver
/// fields are immutable after construction, and the total amount is always
/// derived from the lines rather than stored.
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    buyer_id: BuyerId,
    seller_id: SellerId,
    consumer: Contact,
    receiver: Receiver,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
    refund_requested: bool,
    refund_reason: Option<String>,
}

impl Order {
    /// Creates a new PLACED order owning the given lines.
    pub fn new(
        buyer_id: BuyerId,
        seller_id: SellerId,
        consumer: Contact,
        receiver: Receiver,
        lines: Vec<OrderLine>,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::NoLines);
        }

        Ok(Self {
            id: OrderId::new(),
            buyer_id,
            seller_id,
            consumer,
            receiver,
            status: OrderStatus::Placed,
            ordered_at: Utc::now(),
            lines,
            refund_requested: false,
            refund_reason: None,
        })
    }

    /// Reconstructs an order from persisted state.
    ///
    /// Validation already happened at assembly time; storage implementations
    /// are the only intended callers.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: OrderId,
        buyer_id: BuyerId,
        seller_id: SellerId,
        consumer: Contact,
        receiver: Receiver,
        status: OrderStatus,
        ordered_at: DateTime<Utc>,
        lines: Vec<OrderLine>,
        refund_requested: bool,
        refund_reason: Option<String>,
    ) -> Self {
        Self {
            id,
            buyer_id,
            seller_id,
            consumer,
            receiver,
            status,
            ordered_at,
            lines,
            refund_requested,
            refund_reason,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn consumer(&self) -> &Contact {
        &self.consumer
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn refund_requested(&self) -> bool {
        self.refund_requested
    }

    pub fn refund_reason(&self) -> Option<&str> {
        self.refund_reason.as_deref()
    }

    /// Derived total: `Σ line.subtotal()`.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Guarded transitions
impl Order {
    /// PLACED → PAID, applied when the gateway approves a payment.
    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        if !self.status.can_pay() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "pay",
            });
        }
        self.status = OrderStatus::Paid;
        Ok(())
    }

    /// PAID → SHIPPED, applied when the seller attaches tracking info.
    pub fn ship(&mut self) -> Result<(), DomainError> {
        if !self.status.can_ship() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "ship",
            });
        }
        self.status = OrderStatus::Shipped;
        Ok(())
    }

    /// SHIPPED → COMPLETED.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if !self.status.can_complete() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "complete",
            });
        }
        self.status = OrderStatus::Completed;
        Ok(())
    }

    /// PLACED → CANCELED. Stock restoration is the caller's unit of work.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Canceled;
        Ok(())
    }

    /// Flags a refund request on a PAID order. Not a transition: the order
    /// stays PAID until the seller approves.
    pub fn request_refund(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if !self.status.can_refund() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "request refund for",
            });
        }
        if self.refund_requested {
            return Err(DomainError::RefundAlreadyRequested);
        }
        self.refund_requested = true;
        self.refund_reason = Some(reason.into());
        Ok(())
    }

    /// PAID → REFUNDED, requires a prior buyer request.
    pub fn approve_refund(&mut self) -> Result<(), DomainError> {
        if !self.status.can_refund() {
            return Err(DomainError::InvalidStateTransition {
                current_status: self.status,
                action: "refund",
            });
        }
        if !self.refund_requested {
            return Err(DomainError::RefundNotRequested);
        }
        self.status = OrderStatus::Refunded;
        Ok(())
    }
}
