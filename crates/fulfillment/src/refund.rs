//! Two-step refund workflow: buyer request, seller approval.

use common::{BuyerId, OrderId, PaymentId, SellerId};
use domain::{Order, OrderStatus, Payment};
use store::Store;

use crate::Result;
use crate::error::FulfillmentError;

/// Refunds flow from a buyer request against an APPROVED payment to a seller
/// approval that moves the order PAID → REFUNDED.
pub struct RefundWorkflow<S> {
    store: S,
}

impl<S: Store> RefundWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Flags a refund request on the buyer's own payment.
    ///
    /// The payment must be APPROVED and its order still PAID. The order does
    /// not change status; it stays PAID until the seller decides.
    #[tracing::instrument(skip(self, reason), fields(%payment_id))]
    pub async fn request_refund(
        &self,
        buyer_id: BuyerId,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<Payment> {
        let mut payment = self
            .store
            .payment(payment_id)
            .await?
            .ok_or(FulfillmentError::PaymentNotFound(payment_id))?;
        let mut order = self
            .store
            .order(payment.order_id())
            .await?
            .ok_or(FulfillmentError::OrderNotFound(payment.order_id()))?;

        if order.buyer_id() != buyer_id {
            return Err(FulfillmentError::AccessDenied {
                action: "request refund",
            });
        }

        payment.request_refund(reason)?;
        order.request_refund(reason)?;
        self.store
            .commit_payment(&order, &payment, OrderStatus::Paid)
            .await?;

        metrics::counter!("refund_requests_total").increment(1);
        tracing::info!(order_id = %order.id(), "refund requested");

        Ok(payment)
    }

    /// Approves a pending refund request on the seller's own order,
    /// moving it PAID → REFUNDED.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn approve_refund(&self, seller_id: SellerId, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if order.seller_id() != seller_id {
            return Err(FulfillmentError::AccessDenied {
                action: "approve refund",
            });
        }

        order.approve_refund()?;
        self.store.update_order(&order, OrderStatus::Paid).await?;

        metrics::counter!("refunds_approved_total").increment(1);
        tracing::info!("refund approved");

        Ok(order)
    }
}
