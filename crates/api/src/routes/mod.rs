//! Route handlers and shared application state.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod seller;

use axum::http::HeaderMap;
use common::{BuyerId, SellerId};
use fulfillment::{
    OrderAssembler, OrderService, PaymentProcessor, RefundWorkflow, ShipmentTracker,
    SimulatedGateway,
};
use store::{InMemoryCartStore, InMemoryMemberDirectory, Store};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store + Clone> {
    pub assembler: OrderAssembler<S, InMemoryCartStore, InMemoryMemberDirectory>,
    pub payments: PaymentProcessor<S, SimulatedGateway>,
    pub refunds: RefundWorkflow<S>,
    pub shipments: ShipmentTracker<S>,
    pub orders: OrderService<S>,
    pub store: S,
    pub carts: InMemoryCartStore,
    pub members: InMemoryMemberDirectory,
    pub gateway: SimulatedGateway,
}

fn header_uuid(headers: &HeaderMap, name: &'static str) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::bad_request(format!("{name} header is not valid text")))?;
    let uuid = Uuid::parse_str(raw)
        .map_err(|e| ApiError::bad_request(format!("invalid {name} header: {e}")))?;
    Ok(Some(uuid))
}

/// Extracts the buyer identity from the `X-Buyer-Id` header.
///
/// Token issuance is out of scope; the boundary trusts an upstream
/// authenticator to have populated the header.
pub fn buyer_identity(headers: &HeaderMap) -> Result<BuyerId, ApiError> {
    header_uuid(headers, "x-buyer-id")?
        .map(BuyerId::from_uuid)
        .ok_or_else(|| ApiError::bad_request("missing X-Buyer-Id header"))
}

/// Extracts the seller identity from the `X-Seller-Id` header.
pub fn seller_identity(headers: &HeaderMap) -> Result<SellerId, ApiError> {
    header_uuid(headers, "x-seller-id")?
        .map(SellerId::from_uuid)
        .ok_or_else(|| ApiError::bad_request("missing X-Seller-Id header"))
}

/// Extracts whichever actor identity is present, buyer taking precedence.
pub fn actor_identity(headers: &HeaderMap) -> Result<fulfillment::Actor, ApiError> {
    if let Some(uuid) = header_uuid(headers, "x-buyer-id")? {
        return Ok(fulfillment::Actor::Buyer(BuyerId::from_uuid(uuid)));
    }
    if let Some(uuid) = header_uuid(headers, "x-seller-id")? {
        return Ok(fulfillment::Actor::Seller(SellerId::from_uuid(uuid)));
    }
    Err(ApiError::bad_request(
        "missing X-Buyer-Id or X-Seller-Id header",
    ))
}
