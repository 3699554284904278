use common::{BuyerId, ErrorKind, Money, OrderId, PaymentId, ProductId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the fulfillment services.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("buyer not found: {0}")]
    BuyerNotFound(BuyerId),

    #[error("cart is empty for buyer {0}")]
    EmptyCart(BuyerId),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("product {0} is not available for purchase")]
    ProductNotVisible(ProductId),

    #[error("price of {product_id} changed from {cart_price} to {current_price}")]
    PriceChanged {
        product_id: ProductId,
        cart_price: Money,
        current_price: Money,
    },

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error("an active payment already exists for order {0}")]
    DuplicatePayment(OrderId),

    #[error("declared amount {declared} does not match order total {computed}")]
    AmountMismatch { declared: Money, computed: Money },

    #[error("checkout could not claim stock after repeated attempts")]
    CheckoutContention,

    #[error("{action}: actor does not own this resource")]
    AccessDenied { action: &'static str },

    #[error("{field} must not be blank")]
    BlankField { field: &'static str },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BuyerNotFound(_)
            | Self::EmptyCart(_)
            | Self::ProductNotFound(_)
            | Self::OrderNotFound(_)
            | Self::PaymentNotFound(_) => ErrorKind::NotFound,
            Self::BlankField { .. } => ErrorKind::InvalidInput,
            Self::ProductNotVisible(_)
            | Self::PriceChanged { .. }
            | Self::InsufficientStock { .. }
            | Self::DuplicatePayment(_)
            | Self::AmountMismatch { .. }
            | Self::CheckoutContention => ErrorKind::Conflict,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Domain(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}
