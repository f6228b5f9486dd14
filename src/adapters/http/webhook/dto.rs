//! Response bodies for the webhook endpoint.

use serde::Serialize;

use crate::domain::webhook::DispatchOutcome;

/// Body returned for every webhook delivery.
///
/// Never echoes any part of the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    /// True when the provider should stop retrying.
    pub received: bool,
    /// Terminal state of the delivery (`succeeded`, `duplicate`, ...).
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Duplicate reason or machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DispatchOutcome> for WebhookResponse {
    fn from(outcome: &DispatchOutcome) -> Self {
        let detail = match outcome {
            DispatchOutcome::Duplicate { reason, .. } => Some(reason.as_str()),
            DispatchOutcome::Succeeded { handled: false, .. } => Some("no_handler"),
            _ => outcome.error().map(|e| e.code()),
        };

        Self {
            received: outcome.is_success(),
            outcome: outcome.state().as_str(),
            event_id: outcome.event_id().map(str::to_string),
            detail,
            error: outcome.error().map(|e| e.to_string()),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
