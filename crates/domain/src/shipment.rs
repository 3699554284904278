//! Shipment record attached by the seller.

use chrono::{DateTime, Utc};
use common::{OrderId, ShipmentId};
use serde::{Deserialize, Serialize};

/// Carrier and tracking info for one order (1:1), created only when the
/// order is PAID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub carrier: String,
    pub shipped_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(
        order_id: OrderId,
        tracking_number: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Self {
        Self {
            id: ShipmentId::new(),
            order_id,
            tracking_number: tracking_number.into(),
            carrier: carrier.into(),
            shipped_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_shipment_binds_order() {
        let order_id = OrderId::new();
        let shipment = Shipment::new(order_id, "1Z999", "UPS");
        assert_eq!(shipment.order_id, order_id);
        assert_eq!(shipment.tracking_number, "1Z999");
        assert_eq!(shipment.carrier, "UPS");
    }
}
