//! Product ledger entries and stock write descriptors.

use common::{Money, ProductId, SellerId};
use serde::{Deserialize, Serialize};

/// Authoritative catalog entry: price, visibility and stock per product.
///
/// The `version` counter increases on every stock write and is the token for
/// optimistic concurrency; readers snapshot it and writers compare-and-swap
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub visible: bool,
    pub version: u64,
}

impl Product {
    /// Creates a visible product at version 0.
    pub fn new(
        id: impl Into<ProductId>,
        seller_id: SellerId,
        name: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            seller_id,
            name: name.into(),
            price,
            stock,
            visible: true,
            version: 0,
        }
    }

    /// Returns the same product with visibility turned off.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A compare-and-swap stock decrement, validated against the version the
/// checkout read.
#[derive(Debug, Clone)]
pub struct StockClaim {
    pub product_id: ProductId,
    pub quantity: u32,
    pub expected_version: u64,
}

/// A stock increment applied when a PLACED order is canceled.
#[derive(Debug, Clone)]
pub struct Restock {
    pub product_id: ProductId,
    pub quantity: u32,
}
