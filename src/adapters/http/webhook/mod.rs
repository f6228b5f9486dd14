//! HTTP adapter for inbound provider webhooks.
//!
//! Exposes one `POST` endpoint that hands the exact request body to the
//! [`WebhookDispatcher`](crate::domain::webhook::WebhookDispatcher), plus a
//! health check.

mod dto;
mod handlers;
mod routes;

pub use dto::{HealthResponse, WebhookResponse};
pub use handlers::{handle_webhook, health, WebhookAppState};
pub use routes::webhook_router;
