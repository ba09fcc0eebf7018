//! Fakes and fixtures shared by the engine integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use dealer_common::Cents;
use log::*;
use settlement_engine::{
    db_types::{CustomerContact, NewProduct, Order, OrderDetails, OrderId},
    documents::{DealershipInfo, Document, DocumentError, DocumentGenerator},
    events::EventProducers,
    notifications::{EmailNotifier, MailMessage, MailTransport, NotifierError},
    order_objects::{NewOrderRequest, OrderItemRequest},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CheckoutSession, CheckoutSessions, CheckoutUrls, PaymentProviderError, SessionPaymentStatus},
    OrderApi,
    OrderStore,
    SettlementApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

//--------------------------------------     FakeSessions      ---------------------------------------------------------
/// An in-memory stand-in for the Stripe checkout session API.
#[derive(Clone, Default)]
pub struct FakeSessions {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
}

impl FakeSessions {
    pub fn add_session(&self, session_id: &str, order_id: Option<&OrderId>, status: SessionPaymentStatus, amount: Cents) {
        let session = CheckoutSession {
            session_id: session_id.to_string(),
            payment_status: status,
            order_id: order_id.cloned(),
            customer_email: None,
            amount_total: Some(amount),
            currency: Some("usd".into()),
            url: None,
        };
        self.sessions.lock().unwrap().insert(session_id.to_string(), session);
    }
}

impl CheckoutSessions for FakeSessions {
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentProviderError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentProviderError::SessionNotFound(session_id.to_string()))
    }

    async fn create_session(
        &self,
        order: &OrderDetails,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        let session_id = format!("cs_test_{}", order.order.order_number);
        let session = CheckoutSession {
            session_id: session_id.clone(),
            payment_status: SessionPaymentStatus::Unpaid,
            order_id: Some(order.order.order_id.clone()),
            customer_email: Some(order.order.customer.email.clone()),
            amount_total: Some(order.order.total_price),
            currency: Some(order.order.currency.clone()),
            url: Some(format!("https://checkout.test/{session_id}?return={}", urls.success_url)),
        };
        self.sessions.lock().unwrap().insert(session_id, session.clone());
        Ok(session)
    }
}

//--------------------------------------   CountingDocuments   ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct CountingDocuments {
    calls: Arc<AtomicUsize>,
    unpaid_renders: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingDocuments {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Invoices that were rendered for an order that did not look paid
    pub fn unpaid_renders(&self) -> usize {
        self.unpaid_renders.load(Ordering::SeqCst)
    }
}

impl DocumentGenerator for CountingDocuments {
    async fn generate_invoice(&self, details: &OrderDetails) -> Result<Document, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !details.order.is_paid || details.order.payment_reference.is_none() {
            self.unpaid_renders.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail {
            return Err(DocumentError::RenderError("renderer is on fire".into()));
        }
        Ok(Document::pdf(format!("invoice-{}.pdf", details.order.order_number), b"%PDF-1.4 test".to_vec()))
    }
}

//--------------------------------------        Outbox         ---------------------------------------------------------
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<Vec<MailMessage>>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, email: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|m| m.to == email).count()
    }
}

impl MailTransport for Outbox {
    async fn send(&self, message: MailMessage) -> Result<(), NotifierError> {
        debug!("📧️ Test outbox received mail for {}", message.to);
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

//--------------------------------------      TestSystem       ---------------------------------------------------------
pub type TestSettlementApi = SettlementApi<SqliteDatabase, FakeSessions, CountingDocuments, EmailNotifier<Outbox>>;

pub struct TestSystem {
    pub db_path: String,
    pub sessions: FakeSessions,
    pub documents: CountingDocuments,
    pub outbox: Outbox,
    pub settlement: TestSettlementApi,
    pub orders: OrderApi<SqliteDatabase>,
}

pub struct SystemOptions {
    pub strict_mode: bool,
    pub documents: CountingDocuments,
    pub producers: EventProducers,
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self { strict_mode: true, documents: CountingDocuments::default(), producers: EventProducers::default() }
    }
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_options(SystemOptions::default()).await
    }

    pub async fn with_options(options: SystemOptions) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let sessions = FakeSessions::default();
        let outbox = Outbox::default();
        let notifier = EmailNotifier::new(Some(outbox.clone()), "sales@dealership.test", DealershipInfo::default())
            .expect("Error creating notifier");
        let settlement =
            SettlementApi::new(db.clone(), sessions.clone(), options.documents.clone(), notifier, options.producers)
                .with_strict_mode(options.strict_mode);
        let orders = OrderApi::new(db, "usd");
        seed_catalog(&orders).await;
        Self { db_path: url, sessions, documents: options.documents, outbox, settlement, orders }
    }

    pub async fn place_order(&self, email: &str, items: &[(&str, i64)]) -> Order {
        let request = NewOrderRequest {
            customer: CustomerContact::new("Test Customer", email),
            currency: None,
            payment_method: None,
            items: items.iter().map(|(p, q)| OrderItemRequest::new(*p, *q)).collect(),
        };
        self.orders.place_order(request).await.expect("Error placing order")
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Order {
        self.settlement.db().fetch_order(order_id).await.expect("Error fetching order").expect("Order does not exist")
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.settlement.db_mut().close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        Sqlite::drop_database(&self.db_path).await.ok();
    }
}

pub async fn seed_catalog(api: &OrderApi<SqliteDatabase>) {
    let mut civic = NewProduct::new("civic-2019", "2019 Honda Civic EX", Cents::from_dollars(18_500));
    civic.make = Some("Honda".into());
    civic.model = Some("Civic".into());
    civic.year = Some(2019);
    civic.mileage = Some(41_200);
    civic.fuel_type = Some("Petrol".into());
    civic.color = Some("Blue".into());
    let mut leaf = NewProduct::new("leaf-2022", "2022 Nissan Leaf", Cents::from_dollars(24_900));
    leaf.make = Some("Nissan".into());
    leaf.model = Some("Leaf".into());
    leaf.fuel_type = Some("Electric".into());
    let mats = NewProduct::new("floor-mats", "All-weather floor mats", Cents::from(8_950));
    for product in [civic, leaf, mats] {
        api.upsert_product(product).await.expect("Error seeding catalog");
    }
}
