pub mod assembler;
pub mod error;
pub mod gateway;
pub mod orders;
pub mod payment;
pub mod refund;
pub mod shipment;

pub use assembler::{CheckoutOutcome, OrderAssembler, ShippingInfo};
pub use error::FulfillmentError;
pub use gateway::{Authorization, ChargeRequest, GatewayError, PaymentGateway, SimulatedGateway};
pub use orders::{Actor, OrderService};
pub use payment::{PaymentProcessor, PaymentRequest};
pub use refund::RefundWorkflow;
pub use shipment::ShipmentTracker;

pub type Result<T> = std::result::Result<T, FulfillmentError>;
