use std::env;

use dealer_common::{
    helpers::{env_flag, env_non_empty},
    DEFAULT_CURRENCY_CODE,
};
use dealer_integrations::{MailConfig, PaypalConfig, StripeConfig};
use log::*;
use settlement_engine::documents::{DealershipInfo, HtmlToPdfCommand};

const DEFAULT_DSF_HOST: &str = "127.0.0.1";
const DEFAULT_DSF_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8480";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The externally visible base URL of the storefront. Stripe redirects customers back here.
    pub public_url: String,
    /// When on, webhooks that do not name an order are never matched by payer email.
    pub strict_mode: bool,
    pub currency: String,
    pub stripe: StripeConfig,
    pub paypal: PaypalConfig,
    pub mail: MailConfig,
    pub pdf: HtmlToPdfCommand,
    pub dealership: DealershipInfo,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DSF_HOST.to_string(),
            port: DEFAULT_DSF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            strict_mode: true,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            stripe: StripeConfig::default(),
            paypal: PaypalConfig::default(),
            mail: MailConfig::default(),
            pdf: HtmlToPdfCommand::default(),
            dealership: DealershipInfo::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("DSF_HOST").ok().unwrap_or_else(|| DEFAULT_DSF_HOST.into());
        let port = env::var("DSF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for DSF_PORT. {e} Using the default, {DEFAULT_DSF_PORT}, instead."
                    );
                    DEFAULT_DSF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_DSF_PORT);
        let database_url = env_non_empty("DSF_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ DSF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let public_url = env_non_empty("DSF_PUBLIC_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                warn!(
                    "🪛️ DSF_PUBLIC_URL is not set. Stripe will redirect customers to {DEFAULT_PUBLIC_URL}, which is \
                     only useful for local testing."
                );
                DEFAULT_PUBLIC_URL.to_string()
            });
        let strict_mode = env_flag("DSF_STRICT_MODE", true);
        if !strict_mode {
            info!("🪛️ Strict mode is off. Webhooks without an order id will be matched by payer email.");
        }
        let currency = env_non_empty("DSF_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        Self {
            host,
            port,
            database_url,
            public_url,
            strict_mode,
            currency,
            stripe: StripeConfig::new_from_env_or_default(),
            paypal: PaypalConfig::new_from_env_or_default(),
            mail: MailConfig::new_from_env_or_default(),
            pdf: HtmlToPdfCommand::new_from_env_or_default(),
            dealership: DealershipInfo::new_from_env_or_default(),
        }
    }
}

/// The URLs the hosted checkout page sends customers back to.
#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    pub public_url: String,
}

impl CheckoutConfig {
    pub fn new<S: Into<String>>(public_url: S) -> Self {
        Self { public_url: public_url.into() }
    }

    /// `{CHECKOUT_SESSION_ID}` is filled in by Stripe when it redirects the customer.
    pub fn success_url(&self, order_id: &str) -> String {
        format!("{}/checkout/confirm?session_id={{CHECKOUT_SESSION_ID}}&order_id={order_id}", self.public_url)
    }

    pub fn cancel_url(&self, order_id: &str) -> String {
        format!("{}/cart?order_id={order_id}", self.public_url)
    }
}
