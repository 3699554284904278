//! Order aggregate and related types.

mod aggregate;
mod contact;
mod line;
mod status;

pub use aggregate::Order;
pub use contact::{Contact, Receiver};
pub use line::OrderLine;
pub use status::OrderStatus;
