//! Billing adapters - implementations of the BillingActions port.

mod logging_actions;

pub use logging_actions::LoggingBillingActions;
