use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use dealer_common::Cents;
use log::debug;
use settlement_engine::{
    db_types::{CustomerContact, Order, OrderDetails, OrderId, OrderItem, OrderLine, PaymentMethod, ProductSnapshot},
    documents::Document,
    events::EventProducers,
    traits::{CheckoutSession, SessionPaymentStatus},
    SettlementApi,
};

use super::mocks::{MockDocuments, MockMailer, MockSessions, MockStore};

pub const ORDER_ID: &str = "ord_00000000000000010000000000000001";
pub const ORDER_TOTAL: i64 = 2_850_000;

pub type MockSettlementApi = SettlementApi<MockStore, MockSessions, MockDocuments, MockMailer>;

pub fn settlement_api(
    store: MockStore,
    sessions: MockSessions,
    documents: MockDocuments,
    mailer: MockMailer,
) -> MockSettlementApi {
    SettlementApi::new(store, sessions, documents, mailer, EventProducers::default())
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(path: &str, body: &str, headers: &[(&str, &str)], configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    send(req.set_payload(body.to_string()), configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        // Middleware rejections surface as service errors rather than responses
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

pub fn unpaid_order() -> Order {
    let created = Utc.with_ymd_and_hms(2024, 3, 14, 10, 30, 0).unwrap();
    Order {
        id: 1,
        order_id: OrderId::from(ORDER_ID),
        order_number: 1001,
        customer: CustomerContact::new("Jo Buyer", "jo@example.com"),
        payment_method: None,
        payment_reference: None,
        total_price: Cents::from(ORDER_TOTAL),
        currency: "usd".into(),
        is_paid: false,
        notification_sent: false,
        created_at: created,
        updated_at: created,
    }
}

pub fn paid_order(method: PaymentMethod, reference: &str) -> Order {
    Order {
        payment_method: Some(method),
        payment_reference: Some(reference.to_string()),
        is_paid: true,
        notification_sent: true,
        updated_at: Utc.with_ymd_and_hms(2024, 3, 14, 10, 45, 0).unwrap(),
        ..unpaid_order()
    }
}

pub fn order_details(order: Order) -> OrderDetails {
    let item = OrderItem {
        id: 1,
        order_id: order.order_id.clone(),
        product_id: "car-1".into(),
        product_name: "2021 Mazda CX-5".into(),
        quantity: 1,
        unit_price: Cents::from(ORDER_TOTAL),
    };
    let snapshot = ProductSnapshot {
        title: "2021 Mazda CX-5".into(),
        make: Some("Mazda".into()),
        model: Some("CX-5".into()),
        year: Some(2021),
        price: Cents::from(ORDER_TOTAL),
        ..Default::default()
    };
    OrderDetails { order, lines: vec![OrderLine { item, product: Some(snapshot) }] }
}

pub fn checkout_session(session_id: &str, order_id: Option<&str>, status: SessionPaymentStatus) -> CheckoutSession {
    CheckoutSession {
        session_id: session_id.to_string(),
        payment_status: status,
        order_id: order_id.map(OrderId::from),
        customer_email: Some("jo@example.com".into()),
        amount_total: Some(Cents::from(ORDER_TOTAL)),
        currency: Some("usd".into()),
        url: None,
    }
}

pub fn invoice() -> Document {
    Document::pdf("invoice-1001.pdf", b"%PDF-1.4 test".to_vec())
}
