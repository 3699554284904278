//! Prometheus metrics endpoint.
//!
//! Renders whatever the fulfillment services have recorded: the order
//! lifecycle counters (`orders_placed_total`, `orders_canceled_total`,
//! `orders_shipped_total`, `orders_completed_total`), the
//! outcome-labelled `payment_attempts_total`, the refund counters and
//! `checkout_contention_total`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics in the Prometheus text exposition format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
