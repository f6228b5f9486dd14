//! Webhook endpoint and verification configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;
use crate::domain::webhook::{
    RetryPolicy, VerifierConfig, DEFAULT_PENDING_TIMEOUT_SECS, DEFAULT_TOLERANCE_SECS,
    MAX_PENDING_TIMEOUT_SECS, MIN_PENDING_TIMEOUT_SECS,
};

/// Webhook configuration
#[derive(Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared signing secret issued by the provider (`whsec_...`)
    pub signing_secret: String,

    /// Accepted clock skew between the signed timestamp and now
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,

    /// Name of the header carrying `t=...,v1=...`
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Route the endpoint is mounted at
    #[serde(default = "default_path")]
    pub path: String,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Cap on handler attempts per event id; unset means unlimited
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Age after which a pending record is reclaimed; 0 never reclaims.
    /// Otherwise bounded to 5 minutes..7 days.
    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,
}

impl WebhookConfig {
    /// Creates a configuration with defaults for everything but the secret.
    pub fn with_secret(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            tolerance_secs: default_tolerance_secs(),
            signature_header: default_signature_header(),
            path: default_path(),
            max_body_bytes: default_max_body_bytes(),
            max_attempts: None,
            pending_timeout_secs: default_pending_timeout_secs(),
        }
    }

    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    /// Verifier settings derived from this section
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig::new(self.signing_secret.clone()).with_tolerance(self.tolerance())
    }

    /// Retry policy for the idempotency store
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            pending_timeout: (self.pending_timeout_secs > 0)
                .then(|| Duration::from_secs(self.pending_timeout_secs)),
        }
    }

    /// Validate webhook configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.signing_secret.is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK__SIGNING_SECRET"));
        }
        if environment.requires_live_secret() && !self.signing_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        if self.tolerance_secs == 0 || self.tolerance_secs > 3600 {
            return Err(ValidationError::InvalidTolerance);
        }
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidWebhookPath);
        }
        if axum::http::HeaderName::try_from(self.signature_header.as_str()).is_err() {
            return Err(ValidationError::InvalidSignatureHeader);
        }
        if self.max_body_bytes == 0 {
            return Err(ValidationError::InvalidBodyLimit);
        }
        if self.max_attempts == Some(0) {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.pending_timeout_secs != 0
            && !(MIN_PENDING_TIMEOUT_SECS..=MAX_PENDING_TIMEOUT_SECS)
                .contains(&self.pending_timeout_secs)
        {
            return Err(ValidationError::InvalidPendingTimeout);
        }
        Ok(())
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .field("signature_header", &self.signature_header)
            .field("path", &self.path)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("max_attempts", &self.max_attempts)
            .field("pending_timeout_secs", &self.pending_timeout_secs)
            .finish()
    }
}

fn default_tolerance_secs() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

fn default_signature_header() -> String {
    "Stripe-Signature".to_string()
}

fn default_path() -> String {
    "/webhooks/stripe".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_pending_timeout_secs() -> u64 {
    DEFAULT_PENDING_TIMEOUT_SECS
}
