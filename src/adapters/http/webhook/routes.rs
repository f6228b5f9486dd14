//! Axum router configuration for the webhook endpoint.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{handle_webhook, health, WebhookAppState};

/// Create the webhook router.
///
/// # Routes
/// - `POST {path}` - provider webhook deliveries (signature verified)
/// - `GET /health` - liveness check
///
/// Bodies larger than `max_body_bytes` are refused with 413 before the
/// dispatcher runs.
pub fn webhook_router(state: WebhookAppState, path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            path,
            post(handle_webhook).layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
