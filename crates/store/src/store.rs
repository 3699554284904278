//! The `Store` trait: explicit atomic units of work over relational state.

use async_trait::async_trait;
use common::{BuyerId, OrderId, PaymentId, ProductId, SellerId};
use domain::{Order, OrderStatus, Payment, Shipment};

use crate::error::Result;
use crate::product::{Product, Restock, StockClaim};

/// Pagination window for order listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Creates a page, clamping the size to `1..=MAX_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Storage for products, orders, payments and shipments.
///
/// Every mutating method is one atomic unit of work: it either applies
/// completely or leaves no trace. The `commit_*` methods that change order
/// status re-check the expected source status inside the unit of work, so a
/// concurrent or repeated transition fails with
/// [`StoreError::StaleOrder`](crate::StoreError::StaleOrder) instead of
/// double-applying side effects.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or replaces a product ledger entry.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Reads one product, including its current version.
    async fn product(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Commits a checkout: applies every stock claim by compare-and-swap on
    /// the product version and persists every per-seller order, all or
    /// nothing. A claim that lost the version race fails the whole commit
    /// with `VersionConflict` and no stock decrement survives.
    async fn commit_checkout(&self, orders: &[Order], claims: &[StockClaim]) -> Result<()>;

    /// Commits a cancellation: restores stock for every line and moves the
    /// order PLACED → CANCELED, all or nothing. Fails with `StaleOrder` if
    /// the order is no longer PLACED, so stock is never restored twice.
    async fn commit_cancellation(&self, order: &Order, restocks: &[Restock]) -> Result<()>;

    /// Commits a payment attempt together with the order it settles,
    /// guarded on the order's expected source status.
    async fn commit_payment(
        &self,
        order: &Order,
        payment: &Payment,
        expect: OrderStatus,
    ) -> Result<()>;

    /// Commits a shipment record together with the PAID → SHIPPED order
    /// update, guarded on the expected source status.
    async fn commit_shipment(
        &self,
        order: &Order,
        shipment: &Shipment,
        expect: OrderStatus,
    ) -> Result<()>;

    /// Writes an order, guarded on its expected current status.
    async fn update_order(&self, order: &Order, expect: OrderStatus) -> Result<()>;

    /// Reads one order with its lines.
    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a buyer's orders, newest first.
    async fn orders_for_buyer(&self, buyer_id: BuyerId, page: Page) -> Result<Vec<Order>>;

    /// Lists a seller's orders, newest first.
    async fn orders_for_seller(&self, seller_id: SellerId, page: Page) -> Result<Vec<Order>>;

    /// Reads one payment.
    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// Returns the active (PENDING or APPROVED) payment for an order, if any.
    async fn active_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>>;

    /// Returns the shipment attached to an order, if any.
    async fn shipment_for_order(&self, order_id: OrderId) -> Result<Option<Shipment>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_size() {
        assert_eq!(Page::new(0, 0).size, 1);
        assert_eq!(Page::new(0, 500).size, Page::MAX_SIZE);
        assert_eq!(Page::new(3, 10).offset(), 30);
    }

    #[test]
    fn default_page() {
        let page = Page::default();
        assert_eq!(page.page, 0);
        assert_eq!(page.size, Page::DEFAULT_SIZE);
    }
}
