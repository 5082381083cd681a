//! Error types for the gateway integration.

use crate::domain::Currency;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: Currency, got: Currency },

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Billing-system adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Reasons a payment link could not be produced.
///
/// Every variant is rendered to the payer as an alert; none of them is an
/// HTTP failure of the billing page itself.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Module not configured properly")]
    Configuration,

    #[error("Failed to connect to payment gateway")]
    Transport(String),

    /// The provider answered with an error message.
    #[error("{0}")]
    Upstream(String),

    /// The provider answered without a redirect URL; carries the raw body.
    #[error("Invalid response - {0}")]
    InvalidResponse(String),
}

/// Terminal failures of webhook processing.
///
/// Maps cleanly to HTTP status codes. Duplicates and non-final statuses
/// are acknowledgements, not errors, and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Module Not Activated")]
    NotActivated,

    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid signature")]
    Authentication,

    #[error("Invoice not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// HTTP status code for the response.
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::NotActivated | WebhookError::Validation(_) => 400,
            WebhookError::Authentication => 403,
            WebhookError::NotFound => 404,
            WebhookError::Internal(_) => 500,
        }
    }
}

impl From<RepoError> for WebhookError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => WebhookError::NotFound,
            other => WebhookError::Internal(other.to_string()),
        }
    }
}
