//! Shared types for the storefront core.
//!
//! Typed identifiers keep buyer, seller, order, payment and shipment ids
//! from being mixed up at compile time. `Money` is an integer-cents amount.
//! `ErrorKind` is the machine-readable failure taxonomy every domain error
//! maps into at the HTTP boundary.

mod ids;
mod kind;
mod money;

pub use ids::{BuyerId, OrderId, PaymentId, ProductId, SellerId, ShipmentId};
pub use kind::ErrorKind;
pub use money::Money;
