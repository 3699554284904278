//! Persistence layer for the storefront core.
//!
//! The [`Store`] trait exposes each state change as an explicit atomic unit
//! of work: checkout commit, cancellation commit, payment commit, shipment
//! commit and a status-guarded order update. Stock writes go through
//! compare-and-swap claims against a per-product version counter.
//!
//! The cart lives outside the transactional store on purpose (see
//! [`CartStore`]); it is an eventually-consistent cache that checkout reads
//! and clears but never trusts blindly.

pub mod cart;
pub mod error;
pub mod members;
pub mod memory;
pub mod postgres;
pub mod product;
pub mod store;

pub use cart::{CartItem, CartStore, InMemoryCartStore};
pub use error::{Result, StoreError};
pub use members::{InMemoryMemberDirectory, MemberDirectory};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use product::{Product, Restock, StockClaim};
pub use store::{Page, Store};
