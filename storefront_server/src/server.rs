use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use dealer_integrations::{mail::HttpMailApi, paypal::PaypalApi};
use log::*;
use settlement_engine::{
    documents::{HtmlToPdfCommand, InvoiceGenerator},
    events::EventProducers,
    notifications::EmailNotifier,
    OrderApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    config::{CheckoutConfig, ServerConfig},
    errors::ServerError,
    integrations::{
        event_hooks::create_settlement_event_handlers,
        mail::HttpMailTransport,
        paypal::PaypalWebhookVerifier,
        stripe::{StripeCheckout, StripeWebhookVerifier},
    },
    middleware::WebhookAuthMiddlewareFactory,
    routes::{health, BeginCheckoutRoute, ConfirmCheckoutRoute, OrderByIdRoute, PlaceOrderRoute},
    webhook_routes::{PaypalWebhookRoute, StripeWebhookRoute},
};

pub type InvoiceDocuments = InvoiceGenerator<HtmlToPdfCommand>;
pub type CustomerMailer = EmailNotifier<HttpMailTransport>;
pub type StorefrontSettlementApi = SettlementApi<SqliteDatabase, StripeCheckout, InvoiceDocuments, CustomerMailer>;

const MAX_DB_CONNECTIONS: u32 = 25;

/// Everything the request handlers need, built once at startup and cloned into each worker.
#[derive(Clone)]
pub struct ServerComponents {
    pub db: SqliteDatabase,
    pub stripe: StripeCheckout,
    pub paypal: PaypalApi,
    pub documents: InvoiceDocuments,
    pub notifier: CustomerMailer,
    pub producers: EventProducers,
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let handlers = create_settlement_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let components = build_components(&config, db, producers)?;
    let srv = create_server_instance(config, components)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn build_components(
    config: &ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<ServerComponents, ServerError> {
    let stripe = StripeCheckout::new(config.stripe.clone())?;
    let paypal = PaypalApi::new(config.paypal.clone())?;
    let documents = InvoiceGenerator::new(config.dealership.clone(), config.pdf.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let transport = HttpMailApi::new(&config.mail)?.map(HttpMailTransport::new);
    let notifier = EmailNotifier::new(transport, config.mail.from.clone(), config.dealership.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Invoices will be rendered with '{}'", config.pdf.program());
    Ok(ServerComponents { db, stripe, paypal, documents, notifier, producers })
}

pub fn create_server_instance(config: ServerConfig, components: ServerComponents) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let ServerComponents { db, stripe, paypal, documents, notifier, producers } = components.clone();
        let settlement_api = SettlementApi::new(db.clone(), stripe, documents, notifier, producers)
            .with_strict_mode(config.strict_mode);
        let order_api = OrderApi::new(db, &config.currency);
        let stripe_auth = WebhookAuthMiddlewareFactory::new(
            StripeWebhookVerifier::new(&config.stripe),
            config.stripe.signature_checks,
        );
        let paypal_auth =
            WebhookAuthMiddlewareFactory::new(PaypalWebhookVerifier::new(paypal), config.paypal.signature_checks);
        let api_scope = web::scope("/api")
            .service(PlaceOrderRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new());
        let stripe_scope = web::scope("/webhooks/stripe").wrap(stripe_auth).service(StripeWebhookRoute::<
            SqliteDatabase,
            StripeCheckout,
            InvoiceDocuments,
            CustomerMailer,
        >::new());
        let paypal_scope = web::scope("/webhooks/paypal").wrap(paypal_auth).service(PaypalWebhookRoute::<
            SqliteDatabase,
            StripeCheckout,
            InvoiceDocuments,
            CustomerMailer,
        >::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dsf::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(CheckoutConfig::new(config.public_url.clone())))
            .service(health)
            .service(api_scope)
            .service(BeginCheckoutRoute::<SqliteDatabase, StripeCheckout, InvoiceDocuments, CustomerMailer>::new())
            .service(ConfirmCheckoutRoute::<SqliteDatabase, StripeCheckout, InvoiceDocuments, CustomerMailer>::new())
            .service(stripe_scope)
            .service(paypal_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
