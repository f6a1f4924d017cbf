use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use donut_shop::domain::aggregates::Product;
use donut_shop::domain::value_objects::Money;
use donut_shop::services::auth::AuthService;
use donut_shop::store::memory::MemoryStore;
use donut_shop::{router, AppState};

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
    chocolate: Product,
    morango: Product,
}

fn donut(name: &str, cents: i64) -> Product {
    Product::create(name, Money::new(Decimal::new(cents, 2)).unwrap()).with_image(format!("{}.jpg", name.to_lowercase()))
}

fn setup() -> TestApp {
    let chocolate = donut("Donut Chocolate", 599);
    let morango = donut("Donut Morango", 699);
    let store = Arc::new(MemoryStore::with_products([chocolate.clone(), morango.clone()]));
    let auth = AuthService::new("integration-secret-0123", Duration::hours(1));
    let app = router(AppState::in_memory(store.clone(), auth));
    TestApp { app, store, chocolate, morango }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .send(Method::POST, "/api/register", None, Some(json!({ "name": "Ana", "email": email, "password": "donuts123" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }
}

fn address() -> Value {
    json!({ "rua": "Rua A", "numero": "10", "bairro": "Centro", "cidade": "X", "estado": "Y", "cep": "00000" })
}

#[tokio::test]
async fn test_health() {
    let app = setup();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_profile() {
    let app = setup();
    app.register("ana@example.com").await;

    let (status, body) = app
        .send(Method::POST, "/api/login", None, Some(json!({ "email": "ana@example.com", "password": "donuts123" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, profile) = app.send(Method::GET, "/api/user", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ana@example.com");
    assert!(profile.get("passwordHash").is_none());

    let (status, body) = app
        .send(Method::POST, "/api/login", None, Some(json!({ "email": "ana@example.com", "password": "wrong-one" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app
        .send(Method::POST, "/api/register", None, Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "donuts123" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_auth_gate() {
    let app = setup();
    let (status, body) = app.send(Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = app.send(Method::GET, "/api/cart", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_products() {
    let app = setup();
    let (status, body) = app.send(Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["name"], "Donut Chocolate");
    assert_eq!(body[0]["price"], 5.99);

    let uri = format!("/api/products/{}", app.morango.id);
    let (status, body) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Donut Morango");

    let uri = format!("/api/products/{}", Uuid::now_v7());
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::GET, "/api/products/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
    assert_eq!(body["field"], "id");
}

#[tokio::test]
async fn test_cart_flow() {
    let app = setup();
    let token = app.register("ana@example.com").await;
    let token = Some(token.as_str());

    let (status, cart) = app.send(Method::GET, "/api/cart", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));

    let add = json!({ "productId": app.chocolate.id, "quantity": 2 });
    let (status, cart) = app.send(Method::POST, "/api/cart/items", token, Some(add)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["items"][0]["product"]["name"], "Donut Chocolate");
    assert_eq!(cart["subtotal"], 11.98);

    let (status, cart) = app
        .send(Method::POST, "/api/cart/items", token, Some(json!({ "productId": app.chocolate.id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);

    let (status, body) = app
        .send(Method::POST, "/api/cart/items", token, Some(json!({ "productId": Uuid::now_v7(), "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let item_uri = format!("/api/cart/items/{}", app.chocolate.id);
    let (status, body) = app.send(Method::PATCH, &item_uri, token, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");
    assert_eq!(body["value"], 0);
    let (_, cart) = app.send(Method::GET, "/api/cart", token, None).await;
    assert_eq!(cart["items"][0]["quantity"], 3);

    let (status, cart) = app.send(Method::PATCH, &item_uri, token, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (status, cart) = app.send(Method::DELETE, &item_uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    let (status, _) = app.send(Method::DELETE, &item_uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::DELETE, "/api/cart/items/abc", token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "productId");
    let (status, body) = app.send(Method::PATCH, "/api/cart/items/abc", token, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "productId");

    let (status, cart) = app.send(Method::DELETE, "/api/cart", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
async fn test_create_order_recomputes_total() {
    let app = setup();
    let token = app.register("ana@example.com").await;
    let token = Some(token.as_str());

    let request = json!({
        "lineItems": [{ "productId": app.chocolate.id, "quantity": 2 }],
        "total": 1.00,
        "address": address()
    });
    let (status, order) = app.send(Method::POST, "/api/orders", token, Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], 11.98);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["address"]["street"], "Rua A");
    assert_eq!(order["user"]["email"], "ana@example.com");
    assert_eq!(order["items"][0]["product"]["name"], "Donut Chocolate");
}

#[tokio::test]
async fn test_rejected_orders_persist_nothing() {
    let app = setup();
    let token = app.register("ana@example.com").await;
    let token = Some(token.as_str());

    let unknown = Uuid::now_v7();
    let request = json!({ "lineItems": [{ "productId": unknown, "quantity": 1 }], "total": 5.99, "address": address() });
    let (status, body) = app.send(Method::POST, "/api/orders", token, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "product_not_found");
    assert_eq!(body["productId"], unknown.to_string());

    let request = json!({ "lineItems": [], "total": 5.99, "address": address() });
    let (status, body) = app.send(Method::POST, "/api/orders", token, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "lineItems");

    let request = json!({
        "lineItems": [{ "productId": app.chocolate.id, "quantity": 1 }],
        "total": 5.99,
        "address": { "rua": "Rua A", "numero": "10", "cidade": "X" }
    });
    let (status, body) = app.send(Method::POST, "/api/orders", token, Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_address");
    assert_eq!(body["missing"], json!(["cep", "neighborhood", "state"]));

    let (status, body) = app.send(Method::POST, "/api/orders", token, Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_my_orders_newest_first() {
    let app = setup();
    let ana = app.register("ana@example.com").await;
    let bia = app.register("bia@example.com").await;

    let mut placed = Vec::new();
    for product in [&app.chocolate, &app.morango] {
        let request = json!({ "lineItems": [{ "productId": product.id, "quantity": 1 }], "total": 6, "address": address() });
        let (status, order) = app.send(Method::POST, "/api/orders", Some(ana.as_str()), Some(request)).await;
        assert_eq!(status, StatusCode::CREATED);
        placed.push(order["id"].clone());
    }

    let (status, orders) = app.send(Method::GET, "/api/orders/my-orders", Some(ana.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<Value> = orders.as_array().unwrap().iter().map(|o| o["id"].clone()).collect();
    placed.reverse();
    assert_eq!(ids, placed);

    let (_, orders) = app.send(Method::GET, "/api/orders/my-orders", Some(bia.as_str()), None).await;
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn test_checkout_from_cart() {
    let app = setup();
    let token = app.register("ana@example.com").await;
    let token = Some(token.as_str());

    let (status, body) = app.send(Method::POST, "/api/cart/checkout", token, Some(json!({ "address": address() }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "cart");

    let add = json!({ "productId": app.chocolate.id, "quantity": 2 });
    app.send(Method::POST, "/api/cart/items", token, Some(add)).await;

    let (status, order) = app.send(Method::POST, "/api/cart/checkout", token, Some(json!({ "address": address() }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], 11.98);
    assert_eq!(order["status"], "pending");

    let (_, cart) = app.send(Method::GET, "/api/cart", token, None).await;
    assert_eq!(cart["items"], json!([]));
    assert_eq!(app.store.order_count().await, 1);
}

#[tokio::test]
async fn test_addresses_accept_both_conventions() {
    let app = setup();
    let token = app.register("ana@example.com").await;
    let token = Some(token.as_str());

    let (status, _) = app.send(Method::GET, "/api/addresses", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, localized) = app.send(Method::POST, "/api/addresses", token, Some(address())).await;
    assert_eq!(status, StatusCode::CREATED);

    let english = json!({ "street": "Rua A", "number": "10", "neighborhood": "Centro", "city": "X", "state": "Y", "cep": "00000" });
    let (status, saved) = app.send(Method::POST, "/api/addresses", token, Some(english)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved, localized);

    let (status, stored) = app.send(Method::GET, "/api/addresses", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, saved);
}

#[tokio::test]
async fn test_contact() {
    let app = setup();
    let message = json!({
        "name": "Ana", "email": "ana@example.com", "phone": "11999999999",
        "subject": "Encomenda", "message": "Vocês fazem donuts sem glúten?"
    });
    let (status, body) = app.send(Method::POST, "/api/contact", None, Some(message)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());
    assert_eq!(app.store.contact_messages().await.len(), 1);

    let (status, body) = app.send(Method::POST, "/api/contact", None, Some(json!({ "name": "Ana" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
    assert_eq!(app.store.contact_messages().await.len(), 1);

    let blank_name = json!({
        "name": "   ", "email": "ana@example.com", "phone": "11999999999",
        "subject": "Encomenda", "message": "Oi"
    });
    let (status, body) = app.send(Method::POST, "/api/contact", None, Some(blank_name)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");
    assert_eq!(app.store.contact_messages().await.len(), 1);
}
