use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not obtain an access token. {0}")]
    AuthenticationError(String),
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}

impl IntegrationError {
    /// True if the provider answered with a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::QueryError { status: 404, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookVerificationError {
    #[error("Missing signature header: {0}")]
    MissingHeader(String),
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),
    #[error("Webhook timestamp {0} is outside the tolerance window")]
    TimestampOutOfTolerance(i64),
    #[error("Webhook signature is invalid")]
    InvalidSignature,
    #[error("Could not verify the webhook. {0}")]
    VerificationFailed(String),
}
