//! Buyer-facing order endpoints: checkout, lookup, listing, cancellation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use domain::{Contact, Order, OrderLine, Receiver};
use fulfillment::ShippingInfo;
use serde::{Deserialize, Serialize};
use store::{Page, Store};
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::ApiError;

use super::{AppState, actor_identity, buyer_identity};

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub consumer: ContactRequest,
    pub receiver: ReceiverRequest,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: String,
    pub name: String,
    pub price_snapshot: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub name: String,
    pub phone: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverResponse {
    pub name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub seller_id: Uuid,
    pub status: &'static str,
    pub consumer: ContactResponse,
    pub receiver: ReceiverResponse,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderLineResponse>,
    pub total_amount: Money,
    pub refund_requested: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub total_orders: usize,
    pub orders: Vec<OrderResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id().as_uuid(),
            seller_id: order.seller_id().as_uuid(),
            status: order.status().as_str(),
            consumer: ContactResponse {
                name: order.consumer().name.clone(),
                phone: order.consumer().phone.clone(),
            },
            receiver: ReceiverResponse {
                name: order.receiver().name.clone(),
                phone: order.receiver().phone.clone(),
                address: order.receiver().address.clone(),
            },
            created_at: order.ordered_at(),
            items: order.lines().iter().map(OrderLineResponse::from).collect(),
            total_amount: order.total_amount(),
            refund_requested: order.refund_requested(),
        }
    }
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id().as_str().to_string(),
            name: line.product_name().to_string(),
            price_snapshot: line.price_snapshot(),
            quantity: line.quantity(),
            subtotal: line.subtotal(),
        }
    }
}

// -- Handlers --

/// POST /orders — check out the buyer's cart into per-seller orders.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Envelope<CheckoutResponse>>), ApiError> {
    let buyer_id = buyer_identity(&headers)?;
    let shipping = ShippingInfo {
        consumer: Contact::new(req.consumer.name, req.consumer.phone),
        receiver: Receiver::new(req.receiver.name, req.receiver.phone, req.receiver.address),
    };

    let outcome = state
        .assembler
        .create_order_from_cart(buyer_id, shipping)
        .await?;

    let body = CheckoutResponse {
        total_orders: outcome.total_orders,
        orders: outcome.orders.iter().map(OrderResponse::from).collect(),
    };
    Ok(Envelope::ok(StatusCode::CREATED, "orders created", body))
}

/// GET /orders/{id} — fetch one order the calling actor owns.
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    let actor = actor_identity(&headers)?;
    let order = state
        .orders
        .order_for(actor, OrderId::from_uuid(id))
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "order",
        OrderResponse::from(&order),
    ))
}

/// GET /orders/my — list the calling actor's orders, newest first.
pub async fn list_my<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<(StatusCode, Json<Envelope<Vec<OrderResponse>>>), ApiError> {
    let actor = actor_identity(&headers)?;
    let page = Page::new(
        query.page.unwrap_or(0),
        query.size.unwrap_or(Page::DEFAULT_SIZE),
    );
    let orders = state.orders.orders_for(actor, page).await?;
    let body = orders.iter().map(OrderResponse::from).collect();
    Ok(Envelope::ok(StatusCode::OK, "orders", body))
}

/// POST /orders/{id}/cancel — cancel a PLACED order, restoring stock.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    let buyer_id = buyer_identity(&headers)?;
    let order = state
        .orders
        .cancel_order(buyer_id, OrderId::from_uuid(id))
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "order canceled",
        OrderResponse::from(&order),
    ))
}
