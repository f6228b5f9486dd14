//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `IdempotencyStore` - processing record per webhook event id
//! - `Clock` - current time for verification and record timestamps
//! - `BillingActions` - side effects of the bundled billing handlers

mod billing_actions;
mod clock;
mod idempotency_store;

pub use billing_actions::BillingActions;
pub use clock::Clock;
pub use idempotency_store::IdempotencyStore;
