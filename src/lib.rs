//! Payment Webhooks - verified, idempotent ingestion of provider webhooks
//!
//! Deliveries are authenticated with an HMAC-SHA256 signature, deduplicated
//! by event id, and routed to one handler per event type.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
