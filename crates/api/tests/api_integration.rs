//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{BuyerId, Money, SellerId};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{CartItem, CartStore, MemoryStore, Product, Store};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    state: Arc<api::routes::AppState<MemoryStore>>,
    buyer: BuyerId,
    seller: SellerId,
}

/// Spins up the router over a fresh in-memory store with one registered
/// buyer, one seller, and one product in stock.
async fn setup() -> TestApp {
    let store = MemoryStore::new();
    let config = api::config::Config::default();
    let state = api::create_default_state(store, &config);
    let app = api::create_app(state.clone(), get_metrics_handle());

    let buyer = BuyerId::new();
    let seller = SellerId::new();
    state.members.register_buyer(buyer).await;
    state.members.register_seller(seller).await;
    state
        .store
        .insert_product(Product::new(
            "SKU-001",
            seller,
            "Widget",
            Money::from_cents(1000),
            10,
        ))
        .await
        .unwrap();

    TestApp {
        app,
        state,
        buyer,
        seller,
    }
}

impl TestApp {
    async fn fill_cart(&self, quantity: u32) {
        self.state
            .carts
            .put_item(
                self.buyer,
                CartItem {
                    product_id: "SKU-001".into(),
                    price_at_add: Money::from_cents(1000),
                    quantity,
                },
            )
            .await
            .unwrap();
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn checkout(&self) -> Value {
        let request = Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .header("x-buyer-id", self.buyer.to_string())
            .body(Body::from(
                json!({
                    "consumer": { "name": "Dana", "phone": "010-1111-2222" },
                    "receiver": { "name": "Dana", "phone": "010-1111-2222", "address": "42 Harbor Rd" },
                })
                .to_string(),
            ))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn pay(&self, order_id: &str, cents: i64) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/payments/{order_id}"))
            .header("content-type", "application/json")
            .header("x-buyer-id", self.buyer.to_string())
            .body(Body::from(
                json!({ "amount": cents, "brand": "VISA" }).to_string(),
            ))
            .unwrap();
        self.send(request).await
    }
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;

    let (status, json) = t
        .send(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_checkout_creates_order_with_envelope() {
    let t = setup().await;
    t.fill_cart(2).await;

    let body = t.checkout().await;

    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 201);
    assert_eq!(body["data"]["totalOrders"], 1);

    let order = &body["data"]["orders"][0];
    assert_eq!(order["status"], "PLACED");
    assert_eq!(order["totalAmount"], 2000);
    assert_eq!(order["items"][0]["productId"], "SKU-001");
    assert_eq!(order["items"][0]["priceSnapshot"], 1000);
    assert_eq!(order["items"][0]["subtotal"], 2000);
    assert!(order["orderId"].as_str().is_some());
}

#[tokio::test]
async fn test_checkout_without_identity_is_rejected() {
    let t = setup().await;
    t.fill_cart(1).await;

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "consumer": { "name": "Dana", "phone": "010" },
                "receiver": { "name": "Dana", "phone": "010", "address": "addr" },
            })
            .to_string(),
        ))
        .unwrap();
    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["kind"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_not_found() {
    let t = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .header("x-buyer-id", t.buyer.to_string())
        .body(Body::from(
            json!({
                "consumer": { "name": "Dana", "phone": "010" },
                "receiver": { "name": "Dana", "phone": "010", "address": "addr" },
            })
            .to_string(),
        ))
        .unwrap();
    let (status, json) = t.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["data"]["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_get_order_scoped_by_actor() {
    let t = setup().await;
    t.fill_cart(1).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"].as_str().unwrap();

    // The owning buyer sees the order.
    let (status, json) = t
        .send(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .header("x-buyer-id", t.buyer.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["orderId"], order_id);

    // The owning seller sees it too.
    let (status, _) = t
        .send(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .header("x-seller-id", t.seller.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A stranger gets 403, not 404.
    let (status, json) = t
        .send(
            Request::builder()
                .uri(format!("/orders/{order_id}"))
                .header("x-buyer-id", BuyerId::new().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["data"]["kind"], "ACCESS_DENIED");
}

#[tokio::test]
async fn test_list_my_orders() {
    let t = setup().await;
    t.fill_cart(1).await;
    t.checkout().await;

    let (status, json) = t
        .send(
            Request::builder()
                .uri("/orders/my?page=0&size=10")
                .header("x-buyer-id", t.buyer.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_flow_and_conflicts() {
    let t = setup().await;
    t.fill_cart(2).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"]
        .as_str()
        .unwrap()
        .to_string();

    // Amount mismatch is a 409.
    let (status, json) = t.pay(&order_id, 1999).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["data"]["kind"], "CONFLICT");

    // The exact total is approved.
    let (status, json) = t.pay(&order_id, 2000).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "APPROVED");
    assert!(
        json["data"]["transactionId"]
            .as_str()
            .unwrap()
            .starts_with("TXN-")
    );

    // A second attempt on a PAID order conflicts.
    let (status, _) = t.pay(&order_id, 2000).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_declined_payment_answers_200_with_failed_status() {
    let t = setup().await;
    t.fill_cart(1).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"].as_str().unwrap();

    t.state.gateway.set_decline_next(true);
    let (status, json) = t.pay(order_id, 1000).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "FAILED");
    assert_eq!(json["message"], "payment failed");
}

#[tokio::test]
async fn test_cancel_then_wrong_state_conflict() {
    let t = setup().await;
    t.fill_cart(3).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"].as_str().unwrap();

    let (status, json) = t
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/cancel"))
                .header("x-buyer-id", t.buyer.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "CANCELED");

    // Stock came back.
    let product = t.state.store.product(&"SKU-001".into()).await.unwrap();
    assert_eq!(product.unwrap().stock, 10);

    // Canceling again is a state conflict.
    let (status, _) = t
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/orders/{order_id}/cancel"))
                .header("x-buyer-id", t.buyer.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_full_seller_lifecycle() {
    let t = setup().await;
    t.fill_cart(1).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"]
        .as_str()
        .unwrap()
        .to_string();
    let (status, _) = t.pay(&order_id, 1000).await;
    assert_eq!(status, StatusCode::OK);

    // Ship with tracking info.
    let (status, json) = t
        .send(
            Request::builder()
                .method("PATCH")
                .uri(format!("/seller/orders/{order_id}/ship"))
                .header("content-type", "application/json")
                .header("x-seller-id", t.seller.to_string())
                .body(Body::from(
                    json!({ "trackingNumber": "1Z999", "carrier": "UPS" }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["trackingNumber"], "1Z999");

    // Complete.
    let (status, json) = t
        .send(
            Request::builder()
                .method("PATCH")
                .uri(format!("/seller/orders/{order_id}/complete"))
                .header("x-seller-id", t.seller.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_refund_request_and_approval() {
    let t = setup().await;
    t.fill_cart(1).await;
    let body = t.checkout().await;
    let order_id = body["data"]["orders"][0]["orderId"]
        .as_str()
        .unwrap()
        .to_string();
    let (_, paid) = t.pay(&order_id, 1000).await;
    let payment_id = paid["data"]["paymentId"].as_str().unwrap();

    let (status, json) = t
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/payments/{payment_id}/refund-request"))
                .header("content-type", "application/json")
                .header("x-buyer-id", t.buyer.to_string())
                .body(Body::from(json!({ "reason": "arrived damaged" }).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["refundRequested"], true);

    let (status, json) = t
        .send(
            Request::builder()
                .method("PATCH")
                .uri(format!("/seller/orders/{order_id}/approve-refund"))
                .header("x-seller-id", t.seller.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "REFUNDED");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
