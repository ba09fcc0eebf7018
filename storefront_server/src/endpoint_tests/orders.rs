use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{Order, Product, ProductId},
    OrderApi,
};

use super::{
    helpers::{get_request, order_details, post_request, unpaid_order, ORDER_ID},
    mocks::MockStore,
};
use crate::routes::{OrderByIdRoute, PlaceOrderRoute};

#[actix_web::test]
async fn place_order_prices_items_from_catalog() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().times(1).returning(|id| Ok(Some(product(id, 2_850_000))));
    store
        .expect_insert_order()
        .withf(|order| {
            order.customer.email == "jo@example.com" &&
                order.currency == "usd" &&
                order.items.len() == 1 &&
                order.items[0].product_name == "2021 Mazda CX-5" &&
                order.total_price().value() == 2_850_000
        })
        .times(1)
        .returning(|order| {
            let total_price = order.total_price();
            Ok(Order { order_id: order.order_id, total_price, ..unpaid_order() })
        });
    let body = json!({
        "customer": { "name": "Jo Buyer", "email": " jo@example.com " },
        "items": [{ "product_id": "car-1" }]
    })
    .to_string();
    let (status, body) = post_request("/orders", &body, &[], configure(store)).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["is_paid"], false);
    assert_eq!(order["order_number"], 1001);
    assert!(order["order_id"].as_str().unwrap().starts_with("ord_"));
}

#[actix_web::test]
async fn empty_order_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_order().never();
    let body = json!({ "customer": { "name": "Jo Buyer", "email": "jo@example.com" }, "items": [] }).to_string();
    let (status, body) = post_request("/orders", &body, &[], configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one item"));
}

#[actix_web::test]
async fn order_for_unknown_product_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|_| Ok(None));
    store.expect_insert_order().never();
    let body = json!({
        "customer": { "name": "Jo Buyer", "email": "jo@example.com" },
        "items": [{ "product_id": "car-404", "quantity": 1 }]
    })
    .to_string();
    let (status, body) = post_request("/orders", &body, &[], configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("car-404"));
}

#[actix_web::test]
async fn oversized_quantity_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().never();
    store.expect_insert_order().never();
    let body = json!({
        "customer": { "name": "Jo Buyer", "email": "jo@example.com" },
        "items": [{ "product_id": "floor-mats", "quantity": 315346574667883955_i64 }]
    })
    .to_string();
    let (status, body) = post_request("/orders", &body, &[], configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid quantity"));
}

#[actix_web::test]
async fn order_total_overflow_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_product().returning(|id| Ok(Some(product(id, i64::MAX / 2))));
    store.expect_insert_order().never();
    let body = json!({
        "customer": { "name": "Jo Buyer", "email": "jo@example.com" },
        "items": [{ "product_id": "car-1", "quantity": 3 }]
    })
    .to_string();
    let (status, body) = post_request("/orders", &body, &[], configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("too large"));
}

#[actix_web::test]
async fn fetch_order_details() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_details().returning(|_| Ok(Some(order_details(unpaid_order()))));
    let (status, body) = get_request(&format!("/orders/{ORDER_ID}"), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let details: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(details["order"]["order_id"], ORDER_ID);
    assert_eq!(details["lines"][0]["product"]["make"], "Mazda");
}

#[actix_web::test]
async fn fetch_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_details().returning(|_| Ok(None));
    let (status, _) = get_request("/orders/ord_missing", configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn product(product_id: &ProductId, price: i64) -> Product {
    serde_json::from_value(json!({
        "id": 1,
        "product_id": product_id,
        "title": "2021 Mazda CX-5",
        "make": "Mazda",
        "model": "CX-5",
        "year": 2021,
        "color": null,
        "mileage": 18250,
        "fuel_type": null,
        "price": price,
        "images": [],
        "created_at": "2024-03-01T09:00:00Z",
        "updated_at": "2024-03-01T09:00:00Z"
    }))
    .unwrap()
}

fn configure(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = OrderApi::new(store, "USD");
        cfg.service(PlaceOrderRoute::<MockStore>::new())
            .service(OrderByIdRoute::<MockStore>::new())
            .app_data(web::Data::new(api));
    }
}
