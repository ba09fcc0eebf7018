use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use dealer_integrations::IntegrationError;
use settlement_engine::{traits::PaymentProviderError, OrderApiError, OrderStoreError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("The payment provider could not be reached. {0}")]
    PaymentProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        if e.is_not_found() {
            return Self::NoRecordFound(e.to_string());
        }
        if e.is_conflict() {
            return Self::Conflict(e.to_string());
        }
        match e {
            SettlementError::ProviderError(e) => Self::PaymentProviderError(e.to_string()),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::EmptyOrder
            | OrderApiError::ProductNotFound(_)
            | OrderApiError::InvalidQuantity(_, _)
            | OrderApiError::TotalOutOfRange
            | OrderApiError::InvalidEmail => Self::InvalidRequest(e.to_string()),
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderApiError::OrderAlreadyPaid(_) => Self::Conflict(e.to_string()),
            OrderApiError::StoreError(OrderStoreError::OrderAlreadyExists(_)) => Self::Conflict(e.to_string()),
            OrderApiError::StoreError(e) => Self::BackendError(e.to_string()),
            OrderApiError::ProviderError(e) => Self::from(e),
        }
    }
}

impl From<PaymentProviderError> for ServerError {
    fn from(e: PaymentProviderError) -> Self {
        match e {
            PaymentProviderError::SessionNotFound(_) => Self::NoRecordFound(e.to_string()),
            e => Self::PaymentProviderError(e.to_string()),
        }
    }
}

impl From<IntegrationError> for ServerError {
    fn from(e: IntegrationError) -> Self {
        Self::InitializeError(e.to_string())
    }
}
