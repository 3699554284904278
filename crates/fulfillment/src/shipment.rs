//! Seller-side shipment tracking: ship and complete.

use common::{OrderId, SellerId};
use domain::{Order, OrderStatus, Shipment};
use store::Store;

use crate::Result;
use crate::error::FulfillmentError;

/// Drives the PAID → SHIPPED → COMPLETED half of the order lifecycle.
pub struct ShipmentTracker<S> {
    store: S,
}

impl<S: Store> ShipmentTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records tracking information for a PAID order and marks it SHIPPED.
    #[tracing::instrument(skip(self, tracking_number, carrier), fields(%order_id))]
    pub async fn ship_order(
        &self,
        seller_id: SellerId,
        order_id: OrderId,
        tracking_number: &str,
        carrier: &str,
    ) -> Result<Shipment> {
        if tracking_number.trim().is_empty() {
            return Err(FulfillmentError::BlankField {
                field: "tracking_number",
            });
        }
        if carrier.trim().is_empty() {
            return Err(FulfillmentError::BlankField { field: "carrier" });
        }

        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if order.seller_id() != seller_id {
            return Err(FulfillmentError::AccessDenied {
                action: "ship order",
            });
        }

        order.ship()?;
        let shipment = Shipment::new(order_id, tracking_number, carrier);
        self.store
            .commit_shipment(&order, &shipment, OrderStatus::Paid)
            .await?;

        metrics::counter!("orders_shipped_total").increment(1);
        tracing::info!(shipment_id = %shipment.id, carrier, "order shipped");

        Ok(shipment)
    }

    /// Marks a SHIPPED order COMPLETED.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn complete_order(&self, seller_id: SellerId, order_id: OrderId) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if order.seller_id() != seller_id {
            return Err(FulfillmentError::AccessDenied {
                action: "complete order",
            });
        }

        order.complete()?;
        self.store
            .update_order(&order, OrderStatus::Shipped)
            .await?;

        metrics::counter!("orders_completed_total").increment(1);
        tracing::info!("order completed");

        Ok(order)
    }
}
