//! Application layer - business handlers behind the webhook pipeline.
//!
//! Handlers here implement `WebhookHandler` and coordinate between the
//! decoded event and the ports that carry out side effects.

pub mod handlers;

pub use handlers::register_billing_handlers;
