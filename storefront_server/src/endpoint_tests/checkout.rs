use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use settlement_engine::{
    db_types::PaymentMethod,
    notifications::DeliveryStatus,
    traits::{PaymentProviderError, SessionPaymentStatus},
};

use super::{
    helpers::{
        checkout_session,
        get_request,
        invoice,
        order_details,
        paid_order,
        post_request,
        settlement_api,
        unpaid_order,
        ORDER_ID,
    },
    mocks::{MockDocuments, MockMailer, MockSessions, MockStore},
};
use crate::{
    config::CheckoutConfig,
    routes::{BeginCheckoutRoute, ConfirmCheckoutRoute},
};

fn confirm_path(session_id: &str) -> String {
    format!("/checkout/confirm?session_id={session_id}&order_id={ORDER_ID}")
}

#[actix_web::test]
async fn confirm_paid_session_settles_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().times(1).returning(|_| Ok(Some(unpaid_order())));
    store
        .expect_try_mark_order_settled()
        .times(1)
        .returning(|_, s| Ok(Some(paid_order(s.method, &s.reference))));
    store
        .expect_fetch_order_details()
        .times(1)
        .returning(|_| Ok(Some(order_details(paid_order(PaymentMethod::Stripe, "cs_test_paid")))));
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .times(1)
        .returning(|id| Ok(checkout_session(id, Some(ORDER_ID), SessionPaymentStatus::Paid)));
    let mut documents = MockDocuments::new();
    documents.expect_generate_invoice().times(1).returning(|_| Ok(invoice()));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send_order_confirmation()
        .withf(|details, attachments| {
            details.order.customer.email == "jo@example.com" &&
                attachments.len() == 1 &&
                attachments[0].file_name == "invoice-1001.pdf"
        })
        .times(1)
        .returning(|_, _| Ok(DeliveryStatus::Sent));

    let (status, body) = get_request(&confirm_path("cs_test_paid"), configure(store, sessions, documents, mailer)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "settled");
    assert_eq!(outcome["notification"]["status"], "sent");
    assert_eq!(outcome["order"]["is_paid"], true);
    assert_eq!(outcome["order"]["payment_method"], "stripe");
    assert_eq!(outcome["order"]["payment_reference"], "cs_test_paid");
}

#[actix_web::test]
async fn invoice_describes_the_settled_order_even_if_details_lag() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(unpaid_order())));
    store.expect_try_mark_order_settled().returning(|_, s| Ok(Some(paid_order(s.method, &s.reference))));
    // A replica that has not caught up with the settlement yet
    store.expect_fetch_order_details().returning(|_| Ok(Some(order_details(unpaid_order()))));
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Ok(checkout_session(id, Some(ORDER_ID), SessionPaymentStatus::Paid)));
    let mut documents = MockDocuments::new();
    documents
        .expect_generate_invoice()
        .withf(|details| {
            details.order.is_paid &&
                details.order.payment_method == Some(PaymentMethod::Stripe) &&
                details.order.payment_reference.as_deref() == Some("cs_test_paid") &&
                details.lines.len() == 1
        })
        .times(1)
        .returning(|_| Ok(invoice()));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send_order_confirmation()
        .withf(|details, _| details.order.is_paid)
        .times(1)
        .returning(|_, _| Ok(DeliveryStatus::Sent));

    let (status, body) = get_request(&confirm_path("cs_test_paid"), configure(store, sessions, documents, mailer)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["notification"]["status"], "sent");
}

#[actix_web::test]
async fn reloading_confirmation_page_does_not_resend_invoice() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().times(2).returning(|_| Ok(Some(paid_order(PaymentMethod::Stripe, "cs_test_paid"))));
    store.expect_try_mark_order_settled().times(1).returning(|_, _| Ok(None));
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Ok(checkout_session(id, Some(ORDER_ID), SessionPaymentStatus::Paid)));
    let mut documents = MockDocuments::new();
    documents.expect_generate_invoice().never();
    let mut mailer = MockMailer::new();
    mailer.expect_send_order_confirmation().never();

    let (status, body) = get_request(&confirm_path("cs_test_paid"), configure(store, sessions, documents, mailer)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "already_settled");
    assert!(outcome.get("notification").is_none());
}

#[actix_web::test]
async fn notification_failure_leaves_order_paid() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(unpaid_order())));
    store.expect_try_mark_order_settled().returning(|_, s| Ok(Some(paid_order(s.method, &s.reference))));
    store
        .expect_fetch_order_details()
        .returning(|_| Ok(Some(order_details(paid_order(PaymentMethod::Stripe, "cs_test_paid")))));
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Ok(checkout_session(id, Some(ORDER_ID), SessionPaymentStatus::Paid)));
    let mut documents = MockDocuments::new();
    documents.expect_generate_invoice().returning(|_| {
        Err(settlement_engine::documents::DocumentError::RenderError("wkhtmltopdf exited with status 1".into()))
    });
    let mut mailer = MockMailer::new();
    mailer.expect_send_order_confirmation().never();

    let (status, body) = get_request(&confirm_path("cs_test_paid"), configure(store, sessions, documents, mailer)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(outcome["result"], "settled");
    assert_eq!(outcome["notification"]["status"], "failed");
    assert!(outcome["notification"]["reason"].as_str().unwrap().contains("wkhtmltopdf"));
}

#[actix_web::test]
async fn confirm_session_for_another_order_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_try_mark_order_settled().never();
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Ok(checkout_session(id, Some("ord_someone_else"), SessionPaymentStatus::Paid)));

    let (status, body) =
        get_request(&confirm_path("cs_test_paid"), configure(store, sessions, MockDocuments::new(), MockMailer::new()))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("ord_someone_else"));
}

#[actix_web::test]
async fn confirm_unpaid_session_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_try_mark_order_settled().never();
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Ok(checkout_session(id, Some(ORDER_ID), SessionPaymentStatus::Unpaid)));

    let (status, _) =
        get_request(&confirm_path("cs_test_open"), configure(store, sessions, MockDocuments::new(), MockMailer::new()))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn confirm_unknown_session_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut sessions = MockSessions::new();
    sessions
        .expect_retrieve_session()
        .returning(|id| Err(PaymentProviderError::SessionNotFound(id.to_string())));

    let (status, body) =
        get_request(&confirm_path("cs_test_nope"), configure(MockStore::new(), sessions, MockDocuments::new(), MockMailer::new()))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("cs_test_nope"));
}

#[actix_web::test]
async fn confirm_without_session_id_is_bad_request() {
    let _ = env_logger::try_init().ok();
    let mut sessions = MockSessions::new();
    sessions.expect_retrieve_session().never();
    let path = format!("/checkout/confirm?order_id={ORDER_ID}");
    let (status, _) = get_request(&path, configure(MockStore::new(), sessions, MockDocuments::new(), MockMailer::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn begin_checkout_returns_hosted_page() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order_details().returning(|_| Ok(Some(order_details(unpaid_order()))));
    let mut sessions = MockSessions::new();
    sessions
        .expect_create_session()
        .withf(|details, urls| {
            details.order.order_number == 1001 &&
                urls.success_url ==
                    format!(
                        "https://cars.example/checkout/confirm?session_id={{CHECKOUT_SESSION_ID}}&order_id={ORDER_ID}"
                    ) &&
                urls.cancel_url == format!("https://cars.example/cart?order_id={ORDER_ID}")
        })
        .times(1)
        .returning(|_, _| {
            let mut session = checkout_session("cs_test_new", Some(ORDER_ID), SessionPaymentStatus::Unpaid);
            session.url = Some("https://checkout.stripe.com/c/pay/cs_test_new".into());
            Ok(session)
        });

    let path = format!("/checkout/stripe/{ORDER_ID}");
    let (status, body) = post_request(&path, "", &[], configure(store, sessions, MockDocuments::new(), MockMailer::new())).await;
    assert_eq!(status, StatusCode::OK);
    let started: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(started["session_id"], "cs_test_new");
    assert_eq!(started["url"], "https://checkout.stripe.com/c/pay/cs_test_new");
}

#[actix_web::test]
async fn begin_checkout_for_paid_order_is_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_order_details()
        .returning(|_| Ok(Some(order_details(paid_order(PaymentMethod::Paypal, "CAPTURE-1")))));
    let mut sessions = MockSessions::new();
    sessions.expect_create_session().never();

    let path = format!("/checkout/stripe/{ORDER_ID}");
    let (status, body) = post_request(&path, "", &[], configure(store, sessions, MockDocuments::new(), MockMailer::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already been paid"));
}

fn configure(
    store: MockStore,
    sessions: MockSessions,
    documents: MockDocuments,
    mailer: MockMailer,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let api = settlement_api(store, sessions, documents, mailer);
        cfg.service(BeginCheckoutRoute::<MockStore, MockSessions, MockDocuments, MockMailer>::new())
            .service(ConfirmCheckoutRoute::<MockStore, MockSessions, MockDocuments, MockMailer>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(CheckoutConfig::new("https://cars.example")));
    }
}
