use dealer_common::{
    helpers::{env_flag, env_non_empty},
    Secret,
};
use log::*;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";
pub const DEFAULT_PAYPAL_API_URL: &str = "https://api-m.paypal.com";
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Maximum age of a webhook signature, in seconds.
    pub webhook_tolerance: i64,
    pub signature_checks: bool,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_STRIPE_API_URL.to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            signature_checks: true,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env_non_empty("DSF_STRIPE_API_URL").unwrap_or_else(|| DEFAULT_STRIPE_API_URL.to_string());
        let secret_key = Secret::new(env_non_empty("DSF_STRIPE_SECRET_KEY").unwrap_or_else(|| {
            warn!("🪛️ DSF_STRIPE_SECRET_KEY not set. Stripe API calls will fail.");
            String::default()
        }));
        let webhook_secret = Secret::new(env_non_empty("DSF_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|| {
            warn!("🪛️ DSF_STRIPE_WEBHOOK_SECRET not set. Signed Stripe webhooks will be rejected.");
            String::default()
        }));
        let webhook_tolerance = env_non_empty("DSF_STRIPE_WEBHOOK_TOLERANCE")
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid DSF_STRIPE_WEBHOOK_TOLERANCE '{s}': {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);
        let signature_checks = env_flag("DSF_STRIPE_SIGNATURE_CHECKS", true);
        if !signature_checks {
            warn!("🪛️ Stripe webhook signature checks are DISABLED. Do not run this configuration in production.");
        }
        Self { api_url, secret_key, webhook_secret, webhook_tolerance, signature_checks }
    }
}

#[derive(Debug, Clone)]
pub struct PaypalConfig {
    pub api_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub webhook_id: String,
    pub signature_checks: bool,
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PAYPAL_API_URL.to_string(),
            client_id: String::default(),
            client_secret: Secret::default(),
            webhook_id: String::default(),
            signature_checks: true,
        }
    }
}

impl PaypalConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env_non_empty("DSF_PAYPAL_API_URL").unwrap_or_else(|| DEFAULT_PAYPAL_API_URL.to_string());
        let client_id = env_non_empty("DSF_PAYPAL_CLIENT_ID").unwrap_or_else(|| {
            warn!("🪛️ DSF_PAYPAL_CLIENT_ID not set. PayPal webhooks cannot be verified.");
            String::default()
        });
        let client_secret = Secret::new(env_non_empty("DSF_PAYPAL_CLIENT_SECRET").unwrap_or_else(|| {
            warn!("🪛️ DSF_PAYPAL_CLIENT_SECRET not set. PayPal webhooks cannot be verified.");
            String::default()
        }));
        let webhook_id = env_non_empty("DSF_PAYPAL_WEBHOOK_ID").unwrap_or_else(|| {
            warn!("🪛️ DSF_PAYPAL_WEBHOOK_ID not set. PayPal webhooks cannot be verified.");
            String::default()
        });
        let signature_checks = env_flag("DSF_PAYPAL_SIGNATURE_CHECKS", true);
        if !signature_checks {
            warn!("🪛️ PayPal webhook signature checks are DISABLED. Do not run this configuration in production.");
        }
        Self { api_url, client_id, client_secret, webhook_id, signature_checks }
    }
}

/// Settings for the HTTP mail API. Mail is optional; with no `api_url`, confirmation emails are skipped.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub api_url: Option<String>,
    pub api_key: Secret<String>,
    pub from: String,
}

impl MailConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = env_non_empty("DSF_MAIL_API_URL");
        let api_key = Secret::new(env_non_empty("DSF_MAIL_API_KEY").unwrap_or_default());
        let from = env_non_empty("DSF_MAIL_FROM").unwrap_or_else(|| {
            if api_url.is_some() {
                warn!("🪛️ DSF_MAIL_FROM not set. Using a placeholder sender address.");
            }
            "orders@dealership.example".to_string()
        });
        Self { api_url, api_key, from }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }
}
