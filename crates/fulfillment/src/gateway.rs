//! Payment gateway trait and simulated implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId};
use domain::CardBrand;
use thiserror::Error;

/// Error returned by a payment gateway when a charge cannot be authorized.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("charge declined: {0}")]
    Declined(String),
}

/// A charge submitted to the gateway for authorization.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub brand: CardBrand,
    pub amount: Money,
}

/// Result of a successful authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Transaction ID assigned by the gateway.
    pub transaction_id: String,
}

/// Trait for external payment authorization.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authorizes a charge, returning the gateway transaction ID.
    async fn authorize(&self, charge: &ChargeRequest) -> Result<Authorization, GatewayError>;
}

#[derive(Debug, Default)]
struct SimulatedState {
    charges: HashMap<String, (OrderId, Money)>,
    next_id: u32,
    decline_next: bool,
    delay: Option<Duration>,
}

/// Simulated gateway that approves every charge unless told otherwise.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    state: Arc<RwLock<SimulatedState>>,
}

impl SimulatedGateway {
    /// Creates a new simulated gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline the next charge.
    pub fn set_decline_next(&self, decline: bool) {
        self.state.write().unwrap().decline_next = decline;
    }

    /// Delays every authorization by the given duration.
    pub fn set_delay(&self, delay: Duration) {
        self.state.write().unwrap().delay = Some(delay);
    }

    /// Returns the number of authorized charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, charge: &ChargeRequest) -> Result<Authorization, GatewayError> {
        let delay = self.state.read().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();

        if state.decline_next {
            state.decline_next = false;
            return Err(GatewayError::Declined("card declined".to_string()));
        }

        state.next_id += 1;
        let transaction_id = format!("TXN-{:04}", state.next_id);
        state
            .charges
            .insert(transaction_id.clone(), (charge.order_id, charge.amount));

        Ok(Authorization { transaction_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(amount: i64) -> ChargeRequest {
        ChargeRequest {
            order_id: OrderId::new(),
            brand: CardBrand::Visa,
            amount: Money::from_cents(amount),
        }
    }

    #[tokio::test]
    async fn test_authorize_assigns_sequential_ids() {
        let gateway = SimulatedGateway::new();

        let first = gateway.authorize(&charge(1000)).await.unwrap();
        let second = gateway.authorize(&charge(2000)).await.unwrap();

        assert_eq!(first.transaction_id, "TXN-0001");
        assert_eq!(second.transaction_id, "TXN-0002");
        assert_eq!(gateway.charge_count(), 2);
    }

    #[tokio::test]
    async fn test_decline_next_rejects_once() {
        let gateway = SimulatedGateway::new();
        gateway.set_decline_next(true);

        assert!(gateway.authorize(&charge(1000)).await.is_err());
        assert!(gateway.authorize(&charge(1000)).await.is_ok());
    }
}
