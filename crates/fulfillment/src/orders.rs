//! Actor-scoped order access and buyer cancellation.

use common::{BuyerId, OrderId, SellerId};
use domain::{Order, OrderLine};
use store::{Page, Restock, Store};

use crate::Result;
use crate::error::FulfillmentError;

/// The identity an order query runs under. Access is scoped to ownership:
/// buyers see their own orders, sellers see orders placed against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Buyer(BuyerId),
    Seller(SellerId),
}

/// Read access and cancellation over stored orders.
pub struct OrderService<S> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetches one order the actor owns.
    pub async fn order_for(&self, actor: Actor, order_id: OrderId) -> Result<Order> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        let owned = match actor {
            Actor::Buyer(buyer_id) => order.buyer_id() == buyer_id,
            Actor::Seller(seller_id) => order.seller_id() == seller_id,
        };
        if !owned {
            return Err(FulfillmentError::AccessDenied {
                action: "view order",
            });
        }

        Ok(order)
    }

    /// Lists the actor's orders, newest first.
    pub async fn orders_for(&self, actor: Actor, page: Page) -> Result<Vec<Order>> {
        let orders = match actor {
            Actor::Buyer(buyer_id) => self.store.orders_for_buyer(buyer_id, page).await?,
            Actor::Seller(seller_id) => self.store.orders_for_seller(seller_id, page).await?,
        };
        Ok(orders)
    }

    /// Cancels a PLACED order the buyer owns, restoring claimed stock.
    ///
    /// Restore happens in the same unit of work as the status change; a
    /// repeated or concurrent cancel fails with a stale-order conflict and
    /// can never restock twice.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn cancel_order(&self, buyer_id: BuyerId, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if order.buyer_id() != buyer_id {
            return Err(FulfillmentError::AccessDenied {
                action: "cancel order",
            });
        }

        order.cancel()?;
        let restocks: Vec<Restock> = order
            .lines()
            .iter()
            .map(|line: &OrderLine| Restock {
                product_id: line.product_id().clone(),
                quantity: line.quantity(),
            })
            .collect();
        self.store.commit_cancellation(&order, &restocks).await?;

        metrics::counter!("orders_canceled_total").increment(1);
        tracing::info!("order canceled");

        Ok(order)
    }
}
