//! Payment record bound to exactly one order.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, gateway authorization not yet resolved.
    Pending,
    /// Gateway approved the charge.
    Approved,
    /// Gateway declined or timed out; the order may be retried.
    Failed,
}

impl PaymentStatus {
    /// An active payment blocks further attempts on the same order.
    pub fn is_active(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "APPROVED" => Some(PaymentStatus::Approved),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Card brand declared by the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Local,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "VISA",
            CardBrand::Mastercard => "MASTERCARD",
            CardBrand::Amex => "AMEX",
            CardBrand::Local => "LOCAL",
        }
    }

    pub fn parse(s: &str) -> Option<CardBrand> {
        match s {
            "VISA" => Some(CardBrand::Visa),
            "MASTERCARD" => Some(CardBrand::Mastercard),
            "AMEX" => Some(CardBrand::Amex),
            "LOCAL" => Some(CardBrand::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt for one order.
///
/// The amount is fixed to the order's computed total at creation; at most
/// one active payment exists per order.
#[derive(Debug, Clone)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    brand: CardBrand,
    amount: Money,
    status: PaymentStatus,
    transaction_id: Option<String>,
    refund_requested: bool,
    refund_reason: Option<String>,
    attempted_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a PENDING payment for an order total.
    pub fn new(order_id: OrderId, brand: CardBrand, amount: Money) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            brand,
            amount,
            status: PaymentStatus::Pending,
            transaction_id: None,
            refund_requested: false,
            refund_reason: None,
            attempted_at: Utc::now(),
        }
    }

    /// Reconstructs a payment from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: PaymentId,
        order_id: OrderId,
        brand: CardBrand,
        amount: Money,
        status: PaymentStatus,
        transaction_id: Option<String>,
        refund_requested: bool,
        refund_reason: Option<String>,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_id,
            brand,
            amount,
            status,
            transaction_id,
            refund_requested,
            refund_reason,
            attempted_at,
        }
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn brand(&self) -> CardBrand {
        self.brand
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn refund_requested(&self) -> bool {
        self.refund_requested
    }

    pub fn refund_reason(&self) -> Option<&str> {
        self.refund_reason.as_deref()
    }

    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }

    /// PENDING → APPROVED with the gateway transaction id.
    pub fn approve(&mut self, transaction_id: impl Into<String>) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidPaymentTransition {
                current_status: self.status,
                action: "approve",
            });
        }
        self.status = PaymentStatus::Approved;
        self.transaction_id = Some(transaction_id.into());
        Ok(())
    }

    /// PENDING → FAILED.
    pub fn fail(&mut self) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::InvalidPaymentTransition {
                current_status: self.status,
                action: "fail",
            });
        }
        self.status = PaymentStatus::Failed;
        Ok(())
    }

    /// Flags a refund request on an APPROVED payment.
    pub fn request_refund(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Approved {
            return Err(DomainError::InvalidPaymentTransition {
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
}
