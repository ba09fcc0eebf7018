use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use dealer_common::Secret;
use dealer_integrations::{
    paypal::PaypalApi,
    stripe::{StripeSignatureVerifier, STRIPE_SIGNATURE_HEADER},
    PaypalConfig,
    StripeConfig,
};
use serde_json::{json, Value};
use settlement_engine::{db_types::PaymentMethod, notifications::DeliveryStatus};

use super::{
    helpers::{invoice, order_details, paid_order, post_request, settlement_api, unpaid_order, ORDER_ID, ORDER_TOTAL},
    mocks::{MockDocuments, MockMailer, MockSessions, MockStore},
};
use crate::{
    integrations::{paypal::PaypalWebhookVerifier, stripe::StripeWebhookVerifier},
    middleware::WebhookAuthMiddlewareFactory,
    webhook_routes::{PaypalWebhookRoute, StripeWebhookRoute},
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

//----------------------------------------------   Stripe  ----------------------------------------------------
#[actix_web::test]
async fn signed_stripe_checkout_settles_order() {
    let _ = env_logger::try_init().ok();
    let body = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL);
    let signature = sign(&body);
    let (status, body) = post_request(
        "/webhooks/stripe",
        &body,
        &[(STRIPE_SIGNATURE_HEADER, signature.as_str())],
        configure_stripe(settling_store(), notifying_mailer(), true),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "settled");
    assert_eq!(outcome["order"]["payment_method"], "stripe");
    assert_eq!(outcome["order"]["payment_reference"], "cs_test_webhook");
    assert_eq!(outcome["notification"]["status"], "sent");
}

#[actix_web::test]
async fn stripe_webhook_without_signature_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let body = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL);
    let (status, _) =
        post_request("/webhooks/stripe", &body, &[], configure_stripe(untouched_store(), silent_mailer(), true)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn tampered_stripe_webhook_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let signed = stripe_event("checkout.session.completed", "paid", 100);
    let signature = sign(&signed);
    let tampered = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL);
    let (status, _) = post_request(
        "/webhooks/stripe",
        &tampered,
        &[(STRIPE_SIGNATURE_HEADER, signature.as_str())],
        configure_stripe(untouched_store(), silent_mailer(), true),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn stale_stripe_signature_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let body = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL);
    let signature = verifier().sign(body.as_bytes(), Utc::now().timestamp() - 3600).unwrap();
    let (status, _) = post_request(
        "/webhooks/stripe",
        &body,
        &[(STRIPE_SIGNATURE_HEADER, signature.as_str())],
        configure_stripe(untouched_store(), silent_mailer(), true),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unrelated_stripe_event_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "id": "evt_customer",
        "type": "customer.created",
        "data": { "object": { "id": "cus_1", "email": "jo@example.com" } }
    })
    .to_string();
    let (status, body) =
        post_request("/webhooks/stripe", &body, &[], configure_stripe(untouched_store(), silent_mailer(), false)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["success"], true);
    assert_eq!(reply["message"], "customer.created ignored");
}

#[actix_web::test]
async fn stripe_payment_for_unknown_order_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    store.expect_try_mark_order_settled().never();
    let body = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL);
    let (status, body) =
        post_request("/webhooks/stripe", &body, &[], configure_stripe(store, silent_mailer(), false)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["success"], false);
    assert!(reply["message"].as_str().unwrap().contains("does not exist"));
}

#[actix_web::test]
async fn delayed_stripe_payment_is_acknowledged_without_settling() {
    let _ = env_logger::try_init().ok();
    let body = stripe_event("checkout.session.completed", "unpaid", ORDER_TOTAL);
    let (status, body) =
        post_request("/webhooks/stripe", &body, &[], configure_stripe(untouched_store(), silent_mailer(), false)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["success"], false);
}

#[actix_web::test]
async fn stripe_underpayment_is_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(unpaid_order())));
    store.expect_try_mark_order_settled().never();
    let body = stripe_event("checkout.session.completed", "paid", ORDER_TOTAL - 1);
    let (status, body) =
        post_request("/webhooks/stripe", &body, &[], configure_stripe(store, silent_mailer(), false)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("was paid"));
}

#[actix_web::test]
async fn malformed_stripe_body_is_bad_request() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request("/webhooks/stripe", "{\"id\":", &[], configure_stripe(untouched_store(), silent_mailer(), false))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   PayPal  ----------------------------------------------------
#[actix_web::test]
async fn paypal_capture_settles_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(unpaid_order())));
    store
        .expect_try_mark_order_settled()
        .withf(|_, s| s.method == PaymentMethod::Paypal && s.reference == "CAP-77")
        .times(1)
        .returning(|_, s| Ok(Some(paid_order(s.method, &s.reference))));
    store
        .expect_fetch_order_details()
        .returning(|_| Ok(Some(order_details(paid_order(PaymentMethod::Paypal, "CAP-77")))));
    let body = paypal_capture("PAYMENT.CAPTURE.COMPLETED", "COMPLETED", Some(ORDER_ID));
    let (status, body) = post_request("/webhooks/paypal", &body, &[], configure_paypal(store, notifying_mailer())).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "settled");
    assert_eq!(outcome["order"]["payment_method"], "paypal");
}

#[actix_web::test]
async fn repeated_paypal_capture_is_already_settled() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(paid_order(PaymentMethod::Paypal, "CAP-77"))));
    store.expect_try_mark_order_settled().times(1).returning(|_, _| Ok(None));
    let body = paypal_capture("PAYMENT.CAPTURE.COMPLETED", "COMPLETED", Some(ORDER_ID));
    let (status, body) = post_request("/webhooks/paypal", &body, &[], configure_paypal(store, silent_mailer())).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "already_settled");
}

#[actix_web::test]
async fn paypal_capture_without_order_reference_is_unmatched_in_strict_mode() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_unpaid_orders_for_email().never();
    store.expect_try_mark_order_settled().never();
    let body = paypal_capture("PAYMENT.CAPTURE.COMPLETED", "COMPLETED", None);
    let (status, body) = post_request("/webhooks/paypal", &body, &[], configure_paypal(store, silent_mailer())).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["success"], false);
    assert!(reply["message"].as_str().unwrap().contains("does not reference an order"));
}

#[actix_web::test]
async fn denied_paypal_capture_does_not_settle() {
    let _ = env_logger::try_init().ok();
    let body = paypal_capture("PAYMENT.CAPTURE.DENIED", "DECLINED", Some(ORDER_ID));
    let (status, body) =
        post_request("/webhooks/paypal", &body, &[], configure_paypal(untouched_store(), silent_mailer())).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reply["success"], false);
}

//----------------------------------------------   Fixtures  ----------------------------------------------------
fn verifier() -> StripeSignatureVerifier {
    StripeSignatureVerifier::new(Secret::new(WEBHOOK_SECRET.to_string()), 300)
}

fn sign(body: &str) -> String {
    verifier().sign(body.as_bytes(), Utc::now().timestamp()).unwrap()
}

fn stripe_event(event_type: &str, payment_status: &str, amount: i64) -> String {
    json!({
        "id": "evt_webhook",
        "type": event_type,
        "created": 1_710_412_200,
        "livemode": false,
        "data": { "object": {
            "id": "cs_test_webhook",
            "object": "checkout.session",
            "payment_status": payment_status,
            "status": "complete",
            "metadata": { "order_id": ORDER_ID },
            "customer_details": { "email": "jo@example.com", "name": "Jo Buyer" },
            "amount_total": amount,
            "currency": "usd"
        }}
    })
    .to_string()
}

fn paypal_capture(event_type: &str, status: &str, custom_id: Option<&str>) -> String {
    let mut resource = json!({
        "id": "CAP-77",
        "status": status,
        "amount": { "currency_code": "USD", "value": "28500.00" }
    });
    if let Some(custom_id) = custom_id {
        resource["custom_id"] = json!(custom_id);
    }
    json!({
        "id": "WH-77",
        "event_type": event_type,
        "resource_type": "capture",
        "create_time": "2024-03-14T10:45:00Z",
        "resource": resource
    })
    .to_string()
}

/// A store that settles the order exactly once
fn settling_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(unpaid_order())));
    store.expect_try_mark_order_settled().times(1).returning(|_, s| Ok(Some(paid_order(s.method, &s.reference))));
    store
        .expect_fetch_order_details()
        .returning(|_| Ok(Some(order_details(paid_order(PaymentMethod::Stripe, "cs_test_webhook")))));
    store
}

fn untouched_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_order().never();
    store.expect_try_mark_order_settled().never();
    store
}

fn notifying_mailer() -> MockMailer {
    let mut mailer = MockMailer::new();
    mailer.expect_send_order_confirmation().times(1).returning(|_, _| Ok(DeliveryStatus::Sent));
    mailer
}

fn silent_mailer() -> MockMailer {
    let mut mailer = MockMailer::new();
    mailer.expect_send_order_confirmation().never();
    mailer
}

fn documents() -> MockDocuments {
    let mut documents = MockDocuments::new();
    documents.expect_generate_invoice().returning(|_| Ok(invoice()));
    documents
}

fn configure_stripe(store: MockStore, mailer: MockMailer, signature_checks: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = StripeConfig {
            webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
            signature_checks,
            ..StripeConfig::default()
        };
        let auth = WebhookAuthMiddlewareFactory::new(StripeWebhookVerifier::new(&config), config.signature_checks);
        let api = settlement_api(store, MockSessions::new(), documents(), mailer);
        cfg.service(
            web::scope("/webhooks/stripe")
                .wrap(auth)
                .service(StripeWebhookRoute::<MockStore, MockSessions, MockDocuments, MockMailer>::new()),
        )
        .app_data(web::Data::new(api));
    }
}

fn configure_paypal(store: MockStore, mailer: MockMailer) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = PaypalConfig { signature_checks: false, ..PaypalConfig::default() };
        let paypal = PaypalApi::new(config.clone()).unwrap();
        let auth = WebhookAuthMiddlewareFactory::new(PaypalWebhookVerifier::new(paypal), config.signature_checks);
        let api = settlement_api(store, MockSessions::new(), documents(), mailer);
        cfg.service(
            web::scope("/webhooks/paypal")
                .wrap(auth)
                .service(PaypalWebhookRoute::<MockStore, MockSessions, MockDocuments, MockMailer>::new()),
        )
        .app_data(web::Data::new(api));
    }
}
