//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidHost,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid webhook signing secret format")]
    InvalidWebhookSecret,

    #[error("Signature tolerance must be between 1 and 3600 seconds")]
    InvalidTolerance,

    #[error("Webhook path must start with '/'")]
    InvalidWebhookPath,

    #[error("Invalid signature header name")]
    InvalidSignatureHeader,

    #[error("Webhook body limit must be non-zero")]
    InvalidBodyLimit,

    #[error("Webhook max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Webhook pending_timeout_secs must be 0 or between 300 and 604800")]
    InvalidPendingTimeout,
}
