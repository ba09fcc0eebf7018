use chrono::Utc;
use dealer_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::WebhookVerificationError;

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Verifies the `Stripe-Signature` header on webhook deliveries.
///
/// The header looks like `t=1718000000,v1=5257a8...,v0=...`. The signed payload is `"{t}.{raw body}"`, and each
/// `v1` entry is a hex-encoded HMAC-SHA256 of it, keyed with the endpoint's signing secret. Stripe sends several
/// `v1` entries while a secret is being rolled; any one of them matching is sufficient.
#[derive(Debug, Clone)]
pub struct StripeSignatureVerifier {
    secret: Secret<String>,
    tolerance: i64,
}

impl StripeSignatureVerifier {
    pub fn new(secret: Secret<String>, tolerance: i64) -> Self {
        Self { secret, tolerance }
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), WebhookVerificationError> {
        self.verify_at(payload, header, Utc::now().timestamp())
    }

    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), WebhookVerificationError> {
        if self.secret.is_empty() {
            return Err(WebhookVerificationError::VerificationFailed("No Stripe signing secret is configured".into()));
        }
        let (timestamp, signatures) = parse_header(header)?;
        if (now - timestamp).abs() > self.tolerance {
            debug!("🔐️ Stripe signature timestamp {timestamp} is too far from {now}");
            return Err(WebhookVerificationError::TimestampOutOfTolerance(timestamp));
        }
        let mac = self.mac(timestamp, payload)?;
        let matched = signatures.iter().any(|sig| match hex::decode(sig) {
            Ok(expected) => mac.clone().verify_slice(&expected).is_ok(),
            Err(_) => false,
        });
        if matched {
            trace!("🔐️ Stripe signature verified");
            Ok(())
        } else {
            Err(WebhookVerificationError::InvalidSignature)
        }
    }

    /// Produces a header value for `payload`, in the same format Stripe uses.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, WebhookVerificationError> {
        let signature = hex::encode(self.mac(timestamp, payload)?.finalize().into_bytes());
        Ok(format!("t={timestamp},v1={signature}"))
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookVerificationError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| WebhookVerificationError::VerificationFailed(e.to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookVerificationError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(WebhookVerificationError::MissingHeader(STRIPE_SIGNATURE_HEADER.into()));
    }
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(WebhookVerificationError::MalformedHeader(format!("'{part}' is not a key=value pair")));
        };
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|e| WebhookVerificationError::MalformedHeader(format!("Invalid timestamp. {e}")))?;
                timestamp = Some(t);
            },
            "v1" => signatures.push(value),
            _ => {},
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| WebhookVerificationError::MalformedHeader("No timestamp in header".into()))?;
    if signatures.is_empty() {
        return Err(WebhookVerificationError::MalformedHeader("No v1 signature in header".into()));
    }
    Ok((timestamp, signatures))
}
