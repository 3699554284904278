//! Domain layer for the storefront order core.
//!
//! This crate provides:
//! - the `Order` aggregate, exclusively owning its `OrderLine`s
//! - the `OrderStatus` state machine with transition guards
//! - `Payment` and `Shipment` records with their own guards
//! - `DomainError`, the single failure family for guard violations

pub mod error;
pub mod order;
pub mod payment;
pub mod shipment;

pub use error::DomainError;
pub use order::{Contact, Order, OrderLine, OrderStatus, Receiver};
pub use payment::{CardBrand, Payment, PaymentStatus};
pub use shipment::Shipment;
