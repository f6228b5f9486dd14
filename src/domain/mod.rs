//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (timestamps, errors)
//! - `webhook` - Verification, parsing, deduplication and dispatch of
//!   payment-provider webhook deliveries
//! - `billing` - Provider billing objects carried by webhook events

pub mod billing;
pub mod foundation;
pub mod webhook;
