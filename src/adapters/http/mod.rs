//! HTTP adapters - inbound webhook endpoint.

pub mod webhook;

pub use webhook::{webhook_router, WebhookAppState};
