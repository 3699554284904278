//! HTTP API server for the storefront fulfillment core.
//!
//! Exposes checkout, payment, refund and shipment endpoints over the
//! fulfillment services, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod envelope;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use fulfillment::{
    OrderAssembler, OrderService, PaymentProcessor, RefundWorkflow, ShipmentTracker,
    SimulatedGateway,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryCartStore, InMemoryMemberDirectory, Store};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/my", get(routes::orders::list_my::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/payments/{order_id}", post(routes::payments::pay::<S>))
        .route(
            "/payments/{payment_id}/refund-request",
            post(routes::payments::request_refund::<S>),
        )
        .route("/seller/orders/{id}/ship", patch(routes::seller::ship::<S>))
        .route(
            "/seller/orders/{id}/approve-refund",
            patch(routes::seller::approve_refund::<S>),
        )
        .route(
            "/seller/orders/{id}/complete",
            patch(routes::seller::complete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over the given store.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    config: &Config,
) -> Arc<AppState<S>> {
    let carts = InMemoryCartStore::with_ttl(config.cart_ttl);
    let members = InMemoryMemberDirectory::new();
    let gateway = SimulatedGateway::new();

    Arc::new(AppState {
        assembler: OrderAssembler::new(store.clone(), carts.clone(), members.clone()),
        payments: PaymentProcessor::new(store.clone(), gateway.clone())
            .with_timeout(config.gateway_timeout),
        refunds: RefundWorkflow::new(store.clone()),
        shipments: ShipmentTracker::new(store.clone()),
        orders: OrderService::new(store.clone()),
        store,
        carts,
        members,
        gateway,
    })
}
