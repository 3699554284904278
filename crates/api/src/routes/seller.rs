//! Seller-facing fulfillment endpoints: ship, approve refund, complete.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::Shipment;
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::routes::orders::OrderResponse;

use super::{AppState, seller_identity};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipRequest {
    pub tracking_number: String,
    pub carrier: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResponse {
    pub shipment_id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub carrier: String,
    pub shipped_at: DateTime<Utc>,
}

impl From<&Shipment> for ShipmentResponse {
    fn from(shipment: &Shipment) -> Self {
        Self {
            shipment_id: shipment.id.as_uuid(),
            order_id: shipment.order_id.as_uuid(),
            tracking_number: shipment.tracking_number.clone(),
            carrier: shipment.carrier.clone(),
            shipped_at: shipment.shipped_at,
        }
    }
}

/// PATCH /seller/orders/{id}/ship — attach tracking info, PAID → SHIPPED.
#[tracing::instrument(skip(state, headers, req))]
pub async fn ship<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(req): Json<ShipRequest>,
) -> Result<(StatusCode, Json<Envelope<ShipmentResponse>>), ApiError> {
    let seller_id = seller_identity(&headers)?;
    let shipment = state
        .shipments
        .ship_order(
            seller_id,
            OrderId::from_uuid(order_id),
            &req.tracking_number,
            &req.carrier,
        )
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "order shipped",
        ShipmentResponse::from(&shipment),
    ))
}

/// PATCH /seller/orders/{id}/approve-refund — PAID → REFUNDED, requires a
/// prior buyer request.
#[tracing::instrument(skip(state, headers))]
pub async fn approve_refund<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    let seller_id = seller_identity(&headers)?;
    let order = state
        .refunds
        .approve_refund(seller_id, OrderId::from_uuid(order_id))
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "refund approved",
        OrderResponse::from(&order),
    ))
}

/// PATCH /seller/orders/{id}/complete — SHIPPED → COMPLETED.
#[tracing::instrument(skip(state, headers))]
pub async fn complete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Envelope<OrderResponse>>), ApiError> {
    let seller_id = seller_identity(&headers)?;
    let order = state
        .shipments
        .complete_order(seller_id, OrderId::from_uuid(order_id))
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "order completed",
        OrderResponse::from(&order),
    ))
}
