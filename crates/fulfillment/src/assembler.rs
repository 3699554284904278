//! Checkout: turns a validated cart into one PLACED order per seller.

use common::BuyerId;
use domain::{Contact, DomainError, Order, OrderLine, Receiver};
use store::{CartItem, CartStore, MemberDirectory, Product, StockClaim, Store, StoreError};

use crate::Result;
use crate::error::FulfillmentError;

/// How many times a checkout re-validates and retries after losing a
/// product version race before giving up.
const MAX_CLAIM_ATTEMPTS: usize = 3;

/// Contact and delivery information supplied at checkout.
#[derive(Debug, Clone)]
pub struct ShippingInfo {
    pub consumer: Contact,
    pub receiver: Receiver,
}

/// Result of a committed checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub total_orders: usize,
    pub orders: Vec<Order>,
}

/// Assembles seller-scoped orders from a buyer's cart.
pub struct OrderAssembler<S, C, M> {
    store: S,
    carts: C,
    members: M,
}

impl<S: Store, C: CartStore, M: MemberDirectory> OrderAssembler<S, C, M> {
    pub fn new(store: S, carts: C, members: M) -> Self {
        Self {
            store,
            carts,
            members,
        }
    }

    /// Checks out the buyer's cart into one PLACED order per distinct seller.
    ///
    /// Every line is validated against fresh product state: the product must
    /// exist and be visible, the cart's price snapshot must still match, and
    /// stock must cover the quantity. Stock is then claimed by
    /// compare-and-swap on product versions inside one atomic commit; a lost
    /// race re-validates and retries up to [`MAX_CLAIM_ATTEMPTS`] times.
    ///
    /// The cart is cleared only after the commit succeeds, so a failed
    /// checkout leaves the cart intact for correction.
    #[tracing::instrument(skip(self, shipping), fields(%buyer_id))]
    pub async fn create_order_from_cart(
        &self,
        buyer_id: BuyerId,
        shipping: ShippingInfo,
    ) -> Result<CheckoutOutcome> {
        if !self.members.buyer_exists(buyer_id).await? {
            return Err(FulfillmentError::BuyerNotFound(buyer_id));
        }

        let items = merge_lines(self.carts.items(buyer_id).await?);
        if items.is_empty() {
            return Err(FulfillmentError::EmptyCart(buyer_id));
        }

        let mut attempt = 0;
        let orders = loop {
            attempt += 1;

            let resolved = self.resolve_items(&items).await?;
            let claims: Vec<StockClaim> = resolved
                .iter()
                .map(|(product, item)| StockClaim {
                    product_id: product.id.clone(),
                    quantity: item.quantity,
                    expected_version: product.version,
                })
                .collect();
            let orders = assemble_orders(buyer_id, &shipping, &resolved)?;

            match self.store.commit_checkout(&orders, &claims).await {
                Ok(()) => break orders,
                Err(StoreError::VersionConflict { product_id, .. })
                    if attempt < MAX_CLAIM_ATTEMPTS =>
                {
                    tracing::warn!(%product_id, attempt, "stock claim lost version race, retrying");
                    continue;
                }
                Err(StoreError::VersionConflict { .. }) => {
                    metrics::counter!("checkout_contention_total").increment(1);
                    return Err(FulfillmentError::CheckoutContention);
                }
                Err(e) => return Err(e.into()),
            }
        };

        // The cart sits outside the committed unit of work: a stale cart is
        // harmless, a half-committed checkout is not.
        self.carts.clear(buyer_id).await?;

        metrics::counter!("orders_placed_total").increment(orders.len() as u64);
        tracing::info!(total_orders = orders.len(), "checkout committed");

        Ok(CheckoutOutcome {
            total_orders: orders.len(),
            orders,
        })
    }

    /// Validates every cart line against current product state.
    async fn resolve_items(&self, items: &[CartItem]) -> Result<Vec<(Product, CartItem)>> {
        let mut resolved = Vec::with_capacity(items.len());

        for item in items {
            if item.quantity == 0 {
                return Err(DomainError::InvalidQuantity {
                    quantity: item.quantity,
                }
                .into());
            }
            if item.price_at_add.is_negative() {
                return Err(DomainError::InvalidPrice {
                    price: item.price_at_add.cents(),
                }
                .into());
            }

            let product = self
                .store
                .product(&item.product_id)
                .await?
                .ok_or_else(|| FulfillmentError::ProductNotFound(item.product_id.clone()))?;

            if !product.visible {
                return Err(FulfillmentError::ProductNotVisible(item.product_id.clone()));
            }
            if product.price != item.price_at_add {
                return Err(FulfillmentError::PriceChanged {
                    product_id: item.product_id.clone(),
                    cart_price: item.price_at_add,
                    current_price: product.price,
                });
            }
            if product.stock < item.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            resolved.push((product, item.clone()));
        }

        Ok(resolved)
    }
}

/// Merges duplicate product entries so one claim covers each product.
fn merge_lines(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.product_id == item.product_id && m.price_at_add == item.price_at_add)
        {
            existing.quantity += item.quantity;
        } else {
            merged.push(item);
        }
    }
    merged
}

/// Groups resolved lines by seller (first-appearance order) and builds one
/// PLACED order per group.
fn assemble_orders(
    buyer_id: BuyerId,
    shipping: &ShippingInfo,
    resolved: &[(Product, CartItem)],
) -> Result<Vec<Order>> {
    let mut groups: Vec<(common::SellerId, Vec<OrderLine>)> = Vec::new();

    for (product, item) in resolved {
        let line = OrderLine::new(
            product.id.clone(),
            product.name.clone(),
            item.quantity,
            product.price,
        )?;
        if let Some((_, lines)) = groups.iter_mut().find(|(s, _)| *s == product.seller_id) {
            lines.push(line);
        } else {
            groups.push((product.seller_id, vec![line]));
        }
    }

    groups
        .into_iter()
        .map(|(seller_id, lines)| {
            Order::new(
                buyer_id,
                seller_id,
                shipping.consumer.clone(),
                shipping.receiver.clone(),
                lines,
            )
            .map_err(FulfillmentError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;

    fn item(sku: &str, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: sku.into(),
            price_at_add: Money::from_cents(cents),
            quantity,
        }
    }

    #[test]
    fn merge_sums_same_product_quantities() {
        let merged = merge_lines(vec![
            item("SKU-001", 1000, 2),
            item("SKU-002", 500, 1),
            item("SKU-001", 1000, 3),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity, 5);
        assert_eq!(merged[1].quantity, 1);
    }

    #[test]
    fn merge_keeps_distinct_price_snapshots_apart() {
        let merged = merge_lines(vec![item("SKU-001", 1000, 1), item("SKU-001", 900, 1)]);
        assert_eq!(merged.len(), 2);
    }
}
