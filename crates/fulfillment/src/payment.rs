//! Payment processing against a gateway, with timeout and idempotency guards.

use std::time::Duration;

use common::{BuyerId, Money, OrderId};
use domain::{CardBrand, DomainError, OrderStatus, Payment};
use store::Store;
use uuid::Uuid;

use crate::Result;
use crate::error::FulfillmentError;
use crate::gateway::{ChargeRequest, PaymentGateway};

/// Default time allowed for one gateway authorization round-trip.
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(5);

/// A buyer's request to pay an order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Amount the buyer believes they are paying. Must match the order total.
    pub amount: Money,
    pub brand: CardBrand,
}

/// Drives the PLACED → PAID transition through the payment gateway.
pub struct PaymentProcessor<S, G> {
    store: S,
    gateway: G,
    gateway_timeout: Duration,
}

impl<S: Store, G: PaymentGateway> PaymentProcessor<S, G> {
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store,
            gateway,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Attempts to pay an order.
    ///
    /// A gateway decline or timeout is a normal outcome, not an error: the
    /// attempt is recorded as FAILED, the order stays PLACED, and the buyer
    /// may retry. Only one PENDING or APPROVED payment may exist per order,
    /// and the declared amount must equal the derived order total.
    #[tracing::instrument(skip(self, request), fields(%order_id))]
    pub async fn process_payment(
        &self,
        buyer_id: BuyerId,
        order_id: OrderId,
        request: PaymentRequest,
    ) -> Result<Payment> {
        let correlation_id = Uuid::new_v4();

        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if order.buyer_id() != buyer_id {
            return Err(FulfillmentError::AccessDenied {
                action: "pay order",
            });
        }
        if !order.status().can_pay() {
            return Err(DomainError::InvalidStateTransition {
                current_status: order.status(),
                action: "pay",
            }
            .into());
        }
        if let Some(active) = self.store.active_payment_for_order(order_id).await? {
            tracing::warn!(%correlation_id, payment_id = %active.id(), "active payment already exists");
            return Err(FulfillmentError::DuplicatePayment(order_id));
        }

        let total = order.total_amount();
        if request.amount != total {
            return Err(FulfillmentError::AmountMismatch {
                declared: request.amount,
                computed: total,
            });
        }

        let mut payment = Payment::new(order_id, request.brand, total);
        tracing::info!(
            %correlation_id,
            payment_id = %payment.id(),
            amount = total.cents(),
            "submitting charge"
        );

        let charge = ChargeRequest {
            order_id,
            brand: request.brand,
            amount: total,
        };
        let authorization =
            match tokio::time::timeout(self.gateway_timeout, self.gateway.authorize(&charge)).await
            {
                Ok(Ok(authorization)) => Some(authorization),
                Ok(Err(e)) => {
                    tracing::warn!(%correlation_id, error = %e, "gateway declined charge");
                    None
                }
                // A charge the gateway never confirmed must never mark the
                // order PAID.
                Err(_) => {
                    tracing::warn!(%correlation_id, timeout = ?self.gateway_timeout, "gateway timed out");
                    None
                }
            };

        match authorization {
            Some(authorization) => {
                payment.approve(authorization.transaction_id)?;
                order.mark_paid()?;
                self.store
                    .commit_payment(&order, &payment, OrderStatus::Placed)
                    .await?;
                metrics::counter!("payment_attempts_total", "outcome" => "approved").increment(1);
                tracing::info!(
                    %correlation_id,
                    transaction_id = payment.transaction_id(),
                    "payment approved"
                );
            }
            None => {
                payment.fail()?;
                self.store
                    .commit_payment(&order, &payment, OrderStatus::Placed)
                    .await?;
                metrics::counter!("payment_attempts_total", "outcome" => "failed").increment(1);
            }
        }

        Ok(payment)
    }
}
