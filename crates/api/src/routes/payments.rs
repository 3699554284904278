//! Buyer-facing payment endpoints: pay an order, request a refund.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use domain::{CardBrand, Payment};
use fulfillment::PaymentRequest;
use serde::{Deserialize, Serialize};
use store::Store;
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::ApiError;

use super::{AppState, buyer_identity};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    /// Amount in cents the buyer expects to pay.
    pub amount: i64,
    pub brand: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequestBody {
    pub reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub brand: &'static str,
    pub status: &'static str,
    pub amount: Money,
    pub transaction_id: Option<String>,
    pub refund_requested: bool,
    pub refund_reason: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id().as_uuid(),
            order_id: payment.order_id().as_uuid(),
            brand: payment.brand().as_str(),
            status: payment.status().as_str(),
            amount: payment.amount(),
            transaction_id: payment.transaction_id().map(str::to_string),
            refund_requested: payment.refund_requested(),
            refund_reason: payment.refund_reason().map(str::to_string),
            attempted_at: payment.attempted_at(),
        }
    }
}

/// POST /payments/{orderId} — attempt to pay a PLACED order.
///
/// A declined or timed-out charge still answers 200: the attempt is recorded
/// as FAILED and the order stays PLACED for a retry.
#[tracing::instrument(skip(state, headers, req))]
pub async fn pay<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> Result<(StatusCode, Json<Envelope<PaymentResponse>>), ApiError> {
    let buyer_id = buyer_identity(&headers)?;
    let brand = CardBrand::parse(&req.brand)
        .ok_or_else(|| ApiError::bad_request(format!("unknown card brand: {}", req.brand)))?;

    let payment = state
        .payments
        .process_payment(
            buyer_id,
            OrderId::from_uuid(order_id),
            PaymentRequest {
                amount: Money::from_cents(req.amount),
                brand,
            },
        )
        .await?;

    let message = match payment.transaction_id() {
        Some(_) => "payment approved",
        None => "payment failed",
    };
    Ok(Envelope::ok(
        StatusCode::OK,
        message,
        PaymentResponse::from(&payment),
    ))
}

/// POST /payments/{paymentId}/refund-request — flag a refund request on an
/// APPROVED payment. The order stays PAID until the seller decides.
#[tracing::instrument(skip(state, headers, req))]
pub async fn request_refund<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<RefundRequestBody>,
) -> Result<(StatusCode, Json<Envelope<PaymentResponse>>), ApiError> {
    let buyer_id = buyer_identity(&headers)?;
    if req.reason.trim().is_empty() {
        return Err(ApiError::bad_request("refund reason must not be blank"));
    }

    let payment = state
        .refunds
        .request_refund(buyer_id, PaymentId::from_uuid(payment_id), &req.reason)
        .await?;
    Ok(Envelope::ok(
        StatusCode::OK,
        "refund requested",
        PaymentResponse::from(&payment),
    ))
}
