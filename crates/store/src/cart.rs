//! Per-buyer cart store with rolling expiry.
//!
//! The cart is an external, eventually-consistent key-value collection. It
//! sits outside the checkout transaction boundary: checkout reads it,
//! validates every entry against the live ledger, and clears it strictly
//! after the order commit. A crash between commit and clear leaves a stale
//! cart that the next checkout re-validates rather than trusts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{BuyerId, Money, ProductId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

/// One intended purchase in a buyer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub price_at_add: Money,
    pub quantity: u32,
}

/// Keyed collection of cart items per buyer.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the buyer's current cart items (empty if expired or absent).
    async fn items(&self, buyer_id: BuyerId) -> Result<Vec<CartItem>>;

    /// Adds an item, merging quantity with an existing entry for the same
    /// product, and refreshes the cart's expiry.
    async fn put_item(&self, buyer_id: BuyerId, item: CartItem) -> Result<()>;

    /// Removes the buyer's cart.
    async fn clear(&self, buyer_id: BuyerId) -> Result<()>;
}

#[derive(Debug)]
struct CartEntry {
    items: Vec<CartItem>,
    touched_at: Instant,
}

/// In-memory cart store with a rolling time-to-live per buyer.
#[derive(Debug, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<BuyerId, CartEntry>>>,
    ttl: Duration,
}

impl InMemoryCartStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

    /// Creates a cart store with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    /// Creates a cart store with an explicit rolling TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            carts: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }
}

impl Default for InMemoryCartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn items(&self, buyer_id: BuyerId) -> Result<Vec<CartItem>> {
        let mut carts = self.carts.write().await;
        match carts.get(&buyer_id) {
            Some(entry) if entry.touched_at.elapsed() <= self.ttl => Ok(entry.items.clone()),
            Some(_) => {
                carts.remove(&buyer_id);
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn put_item(&self, buyer_id: BuyerId, item: CartItem) -> Result<()> {
        let mut carts = self.carts.write().await;
        let entry = carts.entry(buyer_id).or_insert_with(|| CartEntry {
            items: Vec::new(),
            touched_at: Instant::now(),
        });

        if entry.touched_at.elapsed() > self.ttl {
            entry.items.clear();
        }
        entry.touched_at = Instant::now();

        if let Some(existing) = entry
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity += item.quantity;
            existing.price_at_add = item.price_at_add;
        } else {
            entry.items.push(item);
        }
        Ok(())
    }

    async fn clear(&self, buyer_id: BuyerId) -> Result<()> {
        self.carts.write().await.remove(&buyer_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(sku),
            price_at_add: Money::from_cents(price),
            quantity,
        }
    }

    #[tokio::test]
    async fn put_and_read_items() {
        let carts = InMemoryCartStore::new();
        let buyer = BuyerId::new();

        carts.put_item(buyer, item("SKU-001", 1000, 2)).await.unwrap();
        carts.put_item(buyer, item("SKU-002", 500, 1)).await.unwrap();

        let items = carts.items(buyer).await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn same_product_merges_quantity() {
        let carts = InMemoryCartStore::new();
        let buyer = BuyerId::new();

        carts.put_item(buyer, item("SKU-001", 1000, 2)).await.unwrap();
        carts.put_item(buyer, item("SKU-001", 1000, 3)).await.unwrap();

        let items = carts.items(buyer).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn clear_removes_cart() {
        let carts = InMemoryCartStore::new();
        let buyer = BuyerId::new();

        carts.put_item(buyer, item("SKU-001", 1000, 1)).await.unwrap();
        carts.clear(buyer).await.unwrap();

        assert!(carts.items(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_cart_reads_empty() {
        let carts = InMemoryCartStore::with_ttl(Duration::ZERO);
        let buyer = BuyerId::new();

        carts.put_item(buyer, item("SKU-001", 1000, 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(carts.items(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn carts_are_isolated_per_buyer() {
        let carts = InMemoryCartStore::new();
        let buyer_a = BuyerId::new();
        let buyer_b = BuyerId::new();

        carts.put_item(buyer_a, item("SKU-001", 1000, 1)).await.unwrap();

        assert_eq!(carts.items(buyer_a).await.unwrap().len(), 1);
        assert!(carts.items(buyer_b).await.unwrap().is_empty());
    }
}
