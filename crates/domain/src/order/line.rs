//! Order lines with immutable price snapshots.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One product's quantity and price snapshot within an order.
///
/// The product reference is weak (for display only); pricing comes from the
/// snapshot frozen at assembly time. Lines are created at assembly and never
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    price_snapshot: Money,
}

impl OrderLine {
    /// Creates a new line, validating quantity and price.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        price_snapshot: Money,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        if price_snapshot.is_negative() {
            return Err(DomainError::InvalidPrice {
                price: price_snapshot.cents(),
            });
        }

        Ok(Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price_snapshot,
        })
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price at order time, immune to later catalog price changes.
    pub fn price_snapshot(&self) -> Money {
        self.price_snapshot
    }

    /// Returns `price_snapshot × quantity`.
    pub fn subtotal(&self) -> Money {
        self.price_snapshot.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_multiplies_snapshot_by_quantity() {
        let line = OrderLine::new("SKU-001", "Widget", 3, Money::from_cents(1000)).unwrap();
        assert_eq!(line.subtotal().cents(), 3000);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let result = OrderLine::new("SKU-001", "Widget", 0, Money::from_cents(1000));
        assert!(matches!(result, Err(DomainError::InvalidQuantity { .. })));
    }

    #[test]
    fn negative_price_is_rejected() {
        let result = OrderLine::new("SKU-001", "Widget", 1, Money::from_cents(-1));
        assert!(matches!(result, Err(DomainError::InvalidPrice { .. })));
    }

    #[test]
    fn zero_price_is_allowed() {
        let line = OrderLine::new("SKU-001", "Freebie", 1, Money::zero()).unwrap();
        assert_eq!(line.subtotal().cents(), 0);
    }
}
