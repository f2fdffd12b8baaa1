//! End-to-end tests of the sales-screen flow against an in-process backend

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, put};
use axum::{Json, Router};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use kasir_client::catalog::{categories, filter_products};
use kasir_client::{
    CatalogApi, CheckoutStep, ClientConfig, ClientError, CustomerType, Decimal, DiscountInfo, OrderController,
    OrderRef, OrdersApi, PaymentMethod, PosError,
};
use serde_json::{Value, json};
use shared::models::{
    OrderPayload, OrderQuery, PayOrderRequest, PaymentStatus, Product, ProductCreate,
    ProductStatus, ProductUpdate,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Reply = (StatusCode, Json<Value>);

#[derive(Default)]
struct Backend {
    token: String,
    orders: Vec<Value>,
    list_queries: Vec<HashMap<String, String>>,
    products: Vec<Value>,
}

type Shared = Arc<Mutex<Backend>>;

fn error(status: StatusCode, detail: Value) -> Reply {
    (status, Json(json!({ "detail": detail })))
}

fn authorized(backend: &Backend, headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", backend.token))
}

async fn list_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, json!("Not authenticated"));
    }
    let status = query.get("payment_status").cloned();
    backend.list_queries.push(query);

    let data: Vec<Value> = backend
        .orders
        .iter()
        .filter(|o| status.as_deref().is_none_or(|s| o["payment_status"] == s))
        .map(|o| {
            let mut summary = o.clone();
            summary.as_object_mut().unwrap().remove("items");
            summary
        })
        .collect();
    let total = data.len();
    (StatusCode::OK, Json(json!({ "data": data, "total": total })))
}

async fn get_order(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let backend = state.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, json!("Not authenticated"));
    }
    match backend.orders.iter().find(|o| o["id"] == id) {
        Some(order) => (StatusCode::OK, Json(order.clone())),
        None => error(StatusCode::NOT_FOUND, json!("Order not found")),
    }
}

async fn post_order(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, json!("Not authenticated"));
    }

    if body["action"] == "pay" {
        let id = body["order_id"].as_u64().unwrap_or_default();
        let Some(order) = backend.orders.iter_mut().find(|o| o["id"] == id) else {
            return error(StatusCode::NOT_FOUND, json!("Order not found"));
        };
        if order["payment_status"] != "unpaid" {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!([{ "msg": "Order already paid" }, { "msg": "action rejected" }]),
            );
        }
        order["payment_status"] = json!("paid");
        order["payment_method"] = body["order"]["payment_method"].clone();
        order["total_amount"] = body["order"]["total_amount"].clone();
        return (StatusCode::OK, Json(json!({ "id": id })));
    }

    let id = backend.orders.len() as u64 + 1;
    let payload = &body["order"];
    let items: Vec<Value> = payload["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "id": i + 1,
                "product_id": item["product_id"],
                "product_name": format!("Menu {}", item["product_id"]),
                "price": item["price"],
                "quantity": item["quantity"],
                "note": item["note"],
            })
        })
        .collect();
    backend.orders.push(json!({
        "id": id,
        "order_number": format!("INV-{:05}", id),
        "order_type": payload["order_type"],
        "total_amount": payload["total_amount"],
        "payment_status": payload["payment_status"],
        "payment_method": payload["payment_method"],
        "created_by": payload["created_by"],
        "created_at": "2026-03-01T09:15:00",
        "items": items,
    }));
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

async fn cancel_order(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Reply {
    let mut backend = state.lock().unwrap();
    if !authorized(&backend, &headers) {
        return error(StatusCode::UNAUTHORIZED, json!("Not authenticated"));
    }
    match backend.orders.iter_mut().find(|o| o["id"] == id) {
        Some(order) => {
            order["payment_status"] = json!("canceled");
            (StatusCode::OK, Json(json!({ "message": "Order canceled" })))
        }
        None => error(StatusCode::NOT_FOUND, json!("Order not found")),
    }
}

async fn list_products(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let backend = state.lock().unwrap();
    let category = query.get("category");
    let rows: Vec<Value> = backend
        .products
        .iter()
        .filter(|p| category.is_none_or(|c| p["category"] == c.as_str()))
        .cloned()
        .collect();
    (StatusCode::OK, Json(json!(rows)))
}

async fn create_product(State(state): State<Shared>, Json(mut body): Json<Value>) -> Reply {
    let mut backend = state.lock().unwrap();
    body["id"] = json!(backend.products.len() + 1);
    body["status"] = json!("active");
    backend.products.push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(changes): Json<Value>,
) -> Reply {
    let mut backend = state.lock().unwrap();
    let Some(product) = backend.products.iter_mut().find(|p| p["id"] == id) else {
        return error(StatusCode::NOT_FOUND, json!("Product not found"));
    };
    for (key, value) in changes.as_object().cloned().unwrap_or_default() {
        product[key.as_str()] = value;
    }
    (StatusCode::OK, Json(product.clone()))
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<u64>) -> StatusCode {
    state.lock().unwrap().products.retain(|p| p["id"] != id);
    StatusCode::NO_CONTENT
}

fn make_token(user_id: u64) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}","role":"cashier"}}"#, user_id))
    )
}

async fn spawn_backend(token: &str) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend {
        token: token.to_string(),
        ..Backend::default()
    }));
    let app = Router::new()
        .route("/orders", get(list_orders).post(post_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", patch(cancel_order))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kasir_client=debug")
        .with_test_writer()
        .try_init();
}

fn product(id: u64, name: &str, price: i64, discount: Option<i64>) -> Product {
    Product {
        id,
        name: name.to_string(),
        price: Decimal::from(price),
        category: "Makanan".to_string(),
        unit: "porsi".to_string(),
        is_package: false,
        image: None,
        discount: discount.map(Decimal::from),
        status: ProductStatus::Active,
    }
}

async fn controller() -> (OrderController, Shared, String) {
    init_tracing();
    let token = make_token(42);
    let (base_url, state) = spawn_backend(&token).await;
    let config = ClientConfig::new(base_url.clone()).with_token(token);
    (OrderController::from_config(&config).unwrap(), state, base_url)
}

fn fill_order(ctl: &mut OrderController) {
    let nasi = product(1, "Nasi Goreng", 10000, None);
    ctl.add_product(&nasi).unwrap();
    ctl.add_product(&nasi).unwrap();
    ctl.add_product(&product(2, "Es Jeruk", 5000, Some(10))).unwrap();
    ctl.set_note(2, "less ice").unwrap();
    ctl.set_discount(Some(DiscountInfo::percentage("10")));
}

#[tokio::test]
async fn test_hold_then_list_over_http() {
    let (mut ctl, state, _) = controller().await;
    ctl.set_customer_type(CustomerType::Grab);
    fill_order(&mut ctl);

    let listing = ctl.hold().await.unwrap();
    assert!(!listing.is_fallback());
    assert!(ctl.draft().is_empty());

    let held = &listing.page.orders[0];
    assert_eq!(listing.page.total_count, 1);
    assert_eq!(held.id, OrderRef::Synced(1));
    assert_eq!(held.items.len(), 2);
    // Subtotal 24500 plus tax; the 10% order discount waits for payment
    assert_eq!(held.total, Decimal::from(26950));
    assert_eq!(held.customer_type, CustomerType::Grab);
    assert_eq!(held.items[1].note.as_deref(), Some("less ice"));

    let backend = state.lock().unwrap();
    let stored = &backend.orders[0];
    assert_eq!(stored["payment_status"], "unpaid");
    assert_eq!(stored["payment_method"], "");
    assert_eq!(stored["order_type"], "GRAB");
    assert_eq!(stored["created_by"], 42);
    assert_eq!(stored["total_amount"].as_f64(), Some(26950.0));
    assert_eq!(stored["items"][1]["price"].as_f64(), Some(4500.0));

    let query = &backend.list_queries[0];
    assert_eq!(query.get("payment_status").map(String::as_str), Some("unpaid"));
    assert_eq!(query.get("limit").map(String::as_str), Some("10000"));
    assert_eq!(query.get("offset").map(String::as_str), Some("0"));
}

#[tokio::test]
async fn test_recall_and_pay_over_http() {
    let (mut ctl, state, _) = controller().await;
    fill_order(&mut ctl);
    let listing = ctl.hold().await.unwrap();
    let held_total = listing.page.orders[0].total;

    ctl.recall(&OrderRef::Synced(1)).await.unwrap();
    assert_eq!(ctl.draft().quantity_of(1), Some(2));
    assert_eq!(ctl.draft().totals().total, held_total);

    ctl.begin_payment().unwrap();
    let receipt = ctl
        .checkout(PaymentMethod::Cash, Some(Decimal::from(30000)))
        .await
        .unwrap();

    // Recalled items carry the discounted price
    assert_eq!(receipt.totals.subtotal, Decimal::from(24500));
    assert_eq!(receipt.totals.total, held_total);
    assert_eq!(receipt.totals.total, Decimal::from(26950));
    assert_eq!(receipt.change, Some(Decimal::from(3050)));
    assert_eq!(ctl.step(), CheckoutStep::Receipt);
    assert_eq!(ctl.held_page().total_count, 0);

    let backend = state.lock().unwrap();
    assert_eq!(backend.orders.len(), 1);
    assert_eq!(backend.orders[0]["payment_status"], "paid");
    assert_eq!(backend.orders[0]["payment_method"], "cash");
    assert_eq!(backend.orders[0]["total_amount"].as_f64(), Some(26950.0));
}

#[tokio::test]
async fn test_delete_held_over_http() {
    let (mut ctl, state, _) = controller().await;
    fill_order(&mut ctl);
    ctl.hold().await.unwrap();

    let listing = ctl.delete_held(&OrderRef::Synced(1)).await.unwrap();
    assert_eq!(listing.page.total_count, 0);
    assert_eq!(state.lock().unwrap().orders[0]["payment_status"], "canceled");
}

#[tokio::test]
async fn test_error_detail_mapping() {
    let token = make_token(1);
    let (base_url, _state) = spawn_backend(&token).await;
    let client = ClientConfig::new(base_url.clone())
        .with_token(token)
        .build_http_client()
        .unwrap();

    match client.get_order(999).await {
        Err(ClientError::NotFound(message)) => assert_eq!(message, "Order not found"),
        other => panic!("unexpected: {:?}", other),
    }

    match client.cancel_order(999).await {
        Err(err) => assert_eq!(err.to_string(), "Not found: Order not found"),
        Ok(v) => panic!("unexpected: {}", v),
    }

    let anonymous = ClientConfig::new(base_url).build_http_client().unwrap();
    match anonymous.list_orders(&OrderQuery::unpaid()).await {
        Err(ClientError::Unauthorized(message)) => assert_eq!(message, "Not authenticated"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_paying_twice_reports_joined_detail() {
    let (mut ctl, _state, base_url) = controller().await;
    fill_order(&mut ctl);
    ctl.hold().await.unwrap();
    ctl.recall(&OrderRef::Synced(1)).await.unwrap();
    let items = ctl.draft().items().to_vec();
    ctl.checkout(PaymentMethod::Qris, None).await.unwrap();

    let client = ClientConfig::new(base_url)
        .with_token(make_token(42))
        .build_http_client()
        .unwrap();
    let order = OrderPayload::settle(
        PaymentStatus::Unpaid,
        CustomerType::DineIn,
        PaymentMethod::Qris,
        &items,
        Decimal::from(26950),
        Some(42),
    );
    match client.pay_order(&PayOrderRequest::new(1, order)).await {
        Err(ClientError::Validation(message)) => {
            assert_eq!(message, "Order already paid, action rejected")
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_backend_serves_cache() {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(format!("http://{}", addr))
        .with_token(make_token(1))
        .with_timeout(2)
        .with_cache_path(dir.path().join("held.redb"));
    let mut ctl = OrderController::from_config(&config).unwrap();

    let listing = ctl.refresh_held().await;
    assert!(listing.is_fallback());
    assert!(listing.page.orders.is_empty());
    assert!(matches!(
        listing.fallback_error,
        Some(PosError::Backend(ClientError::Http(_)))
    ));
}

#[tokio::test]
async fn test_catalog_over_http() {
    let (base_url, _state) = spawn_backend("t").await;
    let client = ClientConfig::new(base_url).with_token("t").build_http_client().unwrap();

    for (name, price, category) in [
        ("Nasi Goreng", 25000, "Makanan Berat"),
        ("Es Teh", 5000, "Minuman"),
        ("Mie Goreng", 22000, "Makanan Berat"),
        ("Kopi Susu", 18000, "Kopi & Teh"),
    ] {
        let created = client
            .create_product(&ProductCreate {
                name: name.to_string(),
                price: Decimal::from(price),
                category: category.to_string(),
                unit: "porsi".to_string(),
                is_package: false,
                image: None,
                discount: None,
            })
            .await
            .unwrap();
        assert!(created.is_active());
    }

    let heavy = client.list_products(Some("Makanan Berat")).await.unwrap();
    assert_eq!(heavy.len(), 2);
    let coffee = client.list_products(Some("Kopi & Teh")).await.unwrap();
    assert_eq!(coffee.len(), 1);
    assert_eq!(coffee[0].name, "Kopi Susu");

    let updated = client
        .update_product(
            2,
            &ProductUpdate {
                price: Some(Decimal::from(6000)),
                discount: Some(Decimal::from(50)),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, Decimal::from(6000));
    assert_eq!(updated.discount, Some(Decimal::from(50)));

    client.delete_product(3).await.unwrap();
    let all = client.list_products(None).await.unwrap();
    assert_eq!(
        categories(&all),
        vec!["All", "Makanan Berat", "Minuman", "Kopi & Teh"]
    );
    assert_eq!(filter_products(&all, "All", "goreng").len(), 1);
}
