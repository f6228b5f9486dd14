//! HTTP handlers for the webhook endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, HeaderName};
use axum::response::IntoResponse;

use crate::domain::webhook::WebhookDispatcher;

use super::dto::{HealthResponse, WebhookResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookAppState {
    pub dispatcher: Arc<WebhookDispatcher>,
    /// Header carrying the provider signature.
    pub signature_header: HeaderName,
}

impl WebhookAppState {
    pub fn new(dispatcher: Arc<WebhookDispatcher>, signature_header: HeaderName) -> Self {
        Self {
            dispatcher,
            signature_header,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// `POST <webhook.path>` - ingest one provider delivery.
///
/// The body is taken as raw bytes; it must reach the verifier unmodified.
/// A header value that is not visible ASCII is treated as absent.
pub async fn handle_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(&state.signature_header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let delivery = state.dispatcher.receive(body, signature);
    let outcome = state.dispatcher.dispatch(delivery).await;

    let status = outcome.status_code();
    tracing::debug!(
        status = status.as_u16(),
        outcome = %outcome.state(),
        "Webhook response"
    );

    (status, Json(WebhookResponse::from(&outcome)))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
