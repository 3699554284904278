//! Member directory boundary.
//!
//! Registration and authentication live outside this core; checkout only
//! needs to resolve that an actor exists.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BuyerId, SellerId};
use tokio::sync::RwLock;

use crate::error::Result;

/// Lookup of known buyers and sellers.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn buyer_exists(&self, buyer_id: BuyerId) -> Result<bool>;
    async fn seller_exists(&self, seller_id: SellerId) -> Result<bool>;
}

/// In-memory member directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberDirectory {
    buyers: Arc<RwLock<HashSet<BuyerId>>>,
    sellers: Arc<RwLock<HashSet<SellerId>>>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buyer.
    pub async fn register_buyer(&self, buyer_id: BuyerId) {
        self.buyers.write().await.insert(buyer_id);
    }

    /// Registers a seller.
    pub async fn register_seller(&self, seller_id: SellerId) {
        self.sellers.write().await.insert(seller_id);
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn buyer_exists(&self, buyer_id: BuyerId) -> Result<bool> {
        Ok(self.buyers.read().await.contains(&buyer_id))
    }

    async fn seller_exists(&self, seller_id: SellerId) -> Result<bool> {
        Ok(self.sellers.read().await.contains(&seller_id))
    }
}
