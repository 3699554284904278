//! In-memory store implementation.
//!
//! All state sits behind a single lock, so every `commit_*` method is
//! trivially one atomic unit of work: claims and guards are verified in
//! full before any write is applied.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BuyerId, OrderId, PaymentId, ProductId, SellerId};
use domain::{Order, OrderStatus, Payment, Shipment};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::product::{Product, Restock, StockClaim};
use crate::store::{Page, Store};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
    shipments: HashMap<OrderId, Shipment>,
}

impl Inner {
    /// Applies every claim to a working copy of the touched products.
    ///
    /// Each claim is checked against the copy's evolving version, so two
    /// claims on the same product behave like two conditional updates:
    /// the second sees the first's version bump and fails.
    fn stage_claims(&self, claims: &[StockClaim]) -> Result<HashMap<ProductId, Product>> {
        let mut staged: HashMap<ProductId, Product> = HashMap::new();
        for claim in claims {
            let product = match staged.entry(claim.product_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let current = self
                        .products
                        .get(&claim.product_id)
                        .ok_or_else(|| StoreError::ProductNotFound(claim.product_id.clone()))?;
                    entry.insert(current.clone())
                }
            };

            if product.version != claim.expected_version || product.stock < claim.quantity {
                return Err(StoreError::VersionConflict {
                    product_id: claim.product_id.clone(),
                    expected: claim.expected_version,
                    actual: product.version,
                });
            }
            product.stock -= claim.quantity;
            product.version += 1;
        }
        Ok(staged)
    }

    fn guard_order(&self, order_id: OrderId, expect: OrderStatus) -> Result<()> {
        let stored = self
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if stored.status() != expect {
            return Err(StoreError::StaleOrder { order_id });
        }
        Ok(())
    }

    fn page_of(mut orders: Vec<Order>, page: Page) -> Vec<Order> {
        orders.sort_by(|a, b| b.ordered_at().cmp(&a.ordered_at()));
        orders
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect()
    }
}

/// In-memory implementation of [`Store`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(id).cloned())
    }

    async fn commit_checkout(&self, orders: &[Order], claims: &[StockClaim]) -> Result<()> {
        let mut inner = self.inner.write().await;

        // Stage everything before touching the live maps.
        let staged = inner.stage_claims(claims)?;

        for (id, product) in staged {
            inner.products.insert(id, product);
        }
        for order in orders {
            inner.orders.insert(order.id(), order.clone());
        }
        Ok(())
    }

    async fn commit_cancellation(&self, order: &Order, restocks: &[Restock]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.guard_order(order.id(), OrderStatus::Placed)?;

        for restock in restocks {
            let product = inner
                .products
                .get_mut(&restock.product_id)
                .ok_or_else(|| StoreError::ProductNotFound(restock.product_id.clone()))?;
            product.stock += restock.quantity;
            product.version += 1;
        }
        inner.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn commit_payment(
        &self,
        order: &Order,
        payment: &Payment,
        expect: OrderStatus,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.guard_order(order.id(), expect)?;
        inner.payments.insert(payment.id(), payment.clone());
        inner.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn commit_shipment(
        &self,
        order: &Order,
        shipment: &Shipment,
        expect: OrderStatus,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.guard_order(order.id(), expect)?;
        inner.shipments.insert(order.id(), shipment.clone());
        inner.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order, expect: OrderStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.guard_order(order.id(), expect)?;
        inner.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn orders_for_buyer(&self, buyer_id: BuyerId, page: Page) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.buyer_id() == buyer_id)
            .cloned()
            .collect();
        Ok(Inner::page_of(orders, page))
    }

    async fn orders_for_seller(&self, seller_id: SellerId, page: Page) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.seller_id() == seller_id)
            .cloned()
            .collect();
        Ok(Inner::page_of(orders, page))
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn active_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .values()
            .find(|p| p.order_id() == order_id && p.status().is_active())
            .cloned())
    }

    async fn shipment_for_order(&self, order_id: OrderId) -> Result<Option<Shipment>> {
        let inner = self.inner.read().await;
        Ok(inner.shipments.get(&order_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use domain::{CardBrand, Contact, OrderLine, Receiver};

    fn product(sku: &str, price: i64, stock: u32) -> Product {
        Product::new(sku, SellerId::new(), "Widget", Money::from_cents(price), stock)
    }

    fn placed_order(sku: &str, quantity: u32, price: i64) -> Order {
        let line = OrderLine::new(sku, "Widget", quantity, Money::from_cents(price)).unwrap();
        Order::new(
            BuyerId::new(),
            SellerId::new(),
            Contact::new("Jin", "010"),
            Receiver::new("Jin", "010", "addr"),
            vec![line],
        )
        .unwrap()
    }

    fn claim(sku: &str, quantity: u32, expected_version: u64) -> StockClaim {
        StockClaim {
            product_id: ProductId::new(sku),
            quantity,
            expected_version,
        }
    }

    #[tokio::test]
    async fn checkout_decrements_stock_and_bumps_version() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 2, 10000);
        store
            .commit_checkout(std::slice::from_ref(&order), &[claim("SKU-001", 2, 0)])
            .await
            .unwrap();

        let stored = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(stored.stock, 8);
        assert_eq!(stored.version, 1);
        assert!(store.order(order.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn checkout_with_stale_version_fails() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 2, 10000);
        let result = store
            .commit_checkout(std::slice::from_ref(&order), &[claim("SKU-001", 2, 7)])
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        let stored = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
        assert!(store.order(order.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_claim_rolls_back_whole_checkout() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();
        store.insert_product(product("SKU-002", 5000, 1)).await.unwrap();

        let order = placed_order("SKU-001", 2, 10000);
        // Second claim requests more than available.
        let result = store
            .commit_checkout(
                std::slice::from_ref(&order),
                &[claim("SKU-001", 2, 0), claim("SKU-002", 5, 0)],
            )
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        let first = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(first.stock, 10);
        assert_eq!(first.version, 0);
    }

    #[tokio::test]
    async fn duplicate_claims_for_one_product_conflict() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 4, 10000);
        // Both claims carry version 0; the first bump invalidates the second,
        // matching the conditional-update behavior of the SQL store.
        let result = store
            .commit_checkout(
                std::slice::from_ref(&order),
                &[claim("SKU-001", 2, 0), claim("SKU-001", 2, 0)],
            )
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        let stored = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
        assert_eq!(stored.version, 0);
        assert!(store.order(order.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancellation_restores_stock_once() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 3, 10000);
        store
            .commit_checkout(std::slice::from_ref(&order), &[claim("SKU-001", 3, 0)])
            .await
            .unwrap();

        let mut canceled = order.clone();
        canceled.cancel().unwrap();
        let restocks = [Restock {
            product_id: ProductId::new("SKU-001"),
            quantity: 3,
        }];
        store.commit_cancellation(&canceled, &restocks).await.unwrap();

        let stored = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);

        // A second cancellation commit must not restock again.
        let result = store.commit_cancellation(&canceled, &restocks).await;
        assert!(matches!(result, Err(StoreError::StaleOrder { .. })));
        let stored = store.product(&ProductId::new("SKU-001")).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
    }

    #[tokio::test]
    async fn payment_commit_guards_source_status() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 1, 10000);
        store
            .commit_checkout(std::slice::from_ref(&order), &[claim("SKU-001", 1, 0)])
            .await
            .unwrap();

        let mut paid = order.clone();
        paid.mark_paid().unwrap();
        let mut payment = Payment::new(order.id(), CardBrand::Visa, order.total_amount());
        payment.approve("TXN-0001").unwrap();

        store
            .commit_payment(&paid, &payment, OrderStatus::Placed)
            .await
            .unwrap();

        // Replaying the same transition fails: the order is no longer PLACED.
        let result = store
            .commit_payment(&paid, &payment, OrderStatus::Placed)
            .await;
        assert!(matches!(result, Err(StoreError::StaleOrder { .. })));

        let active = store.active_payment_for_order(order.id()).await.unwrap();
        assert_eq!(active.unwrap().id(), payment.id());
    }

    #[tokio::test]
    async fn failed_payment_is_not_active() {
        let store = MemoryStore::new();
        store.insert_product(product("SKU-001", 10000, 10)).await.unwrap();

        let order = placed_order("SKU-001", 1, 10000);
        store
            .commit_checkout(std::slice::from_ref(&order), &[claim("SKU-001", 1, 0)])
            .await
            .unwrap();

        let mut payment = Payment::new(order.id(), CardBrand::Visa, order.total_amount());
        payment.fail().unwrap();
        store
            .commit_payment(&order, &payment, OrderStatus::Placed)
            .await
            .unwrap();

        assert!(store.active_payment_for_order(order.id()).await.unwrap().is_none());
        assert!(store.payment(payment.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn buyer_listing_is_paged_newest_first() {
        let store = MemoryStore::new();
        let buyer = BuyerId::new();

        for i in 0..5u32 {
            let sku = format!("SKU-{i:03}");
            store
                .insert_product(product(&sku, 1000, 10))
                .await
                .unwrap();
            let line = OrderLine::new(sku.as_str(), "Widget", 1, Money::from_cents(1000)).unwrap();
            let order = Order::new(
                buyer,
                SellerId::new(),
                Contact::new("Jin", "010"),
                Receiver::new("Jin", "010", "addr"),
                vec![line],
            )
            .unwrap();
            store
                .commit_checkout(&[order], &[claim(&sku, 1, 0)])
                .await
                .unwrap();
        }

        let first = store.orders_for_buyer(buyer, Page::new(0, 2)).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].ordered_at() >= first[1].ordered_at());

        let last = store.orders_for_buyer(buyer, Page::new(2, 2)).await.unwrap();
        assert_eq!(last.len(), 1);
    }
}
