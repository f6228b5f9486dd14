//! Webhook error types.
//!
//! Defines every error condition that can occur while ingesting a webhook
//! delivery, with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Signature verification failures. All are permanent and caller-fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The signature header was absent or blank.
    #[error("Missing signature header")]
    MissingHeader,

    /// The signature header could not be parsed or carried no `v1` entry.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// No supplied `v1` MAC matched the expected value.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The signed timestamp is outside the tolerance window.
    #[error("Timestamp outside tolerance window")]
    StaleTimestamp,

    /// The configured signing secret is empty.
    #[error("Signing secret is empty")]
    EmptySecret,
}

/// Failure to decode a verified body into a webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

/// Failure reported by (or around) a registered webhook handler.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The event can never be applied (e.g. payload does not match the type).
    #[error("Permanent handler failure: {0}")]
    Permanent(String),

    /// The handler may succeed on a later delivery.
    #[error("Transient handler failure: {0}")]
    Transient(String),

    /// A downstream port failed.
    #[error("Downstream failure: {0}")]
    Downstream(#[from] DomainError),

    /// The handler panicked; the panic was contained at the invocation boundary.
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

/// Umbrella error for a single delivery.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Handler failed: {0}")]
    Handler(#[from] HandlerError),

    /// The idempotency store could not be read or written.
    #[error("Idempotency store error: {0}")]
    Store(DomainError),
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err)
    }
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    ///
    /// Handler failures are transient by assumption, whatever the handler
    /// reports; the provider's own backoff is the recovery path.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Handler(_) | WebhookError::Store(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine the provider's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Verification(
                VerificationError::SignatureMismatch | VerificationError::StaleTimestamp,
            ) => StatusCode::UNAUTHORIZED,

            WebhookError::Verification(_) | WebhookError::Parse(_) => StatusCode::BAD_REQUEST,

            WebhookError::Handler(_) | WebhookError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable code for logs and response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::Verification(VerificationError::MissingHeader) => "MISSING_HEADER",
            WebhookError::Verification(VerificationError::MalformedHeader(_)) => {
                "MALFORMED_HEADER"
            }
            WebhookError::Verification(VerificationError::SignatureMismatch) => {
                "SIGNATURE_MISMATCH"
            }
            WebhookError::Verification(VerificationError::StaleTimestamp) => "STALE_TIMESTAMP",
            WebhookError::Verification(VerificationError::EmptySecret) => "EMPTY_SECRET",
            WebhookError::Parse(_) => "MALFORMED_PAYLOAD",
            WebhookError::Handler(_) => "HANDLER_FAILED",
            WebhookError::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}
