//! Adapters - Implementations of port interfaces.
//!
//! - `http` - axum endpoint receiving provider deliveries
//! - `memory` / `postgres` - `IdempotencyStore` backends
//! - `clock` - system and fixed clocks
//! - `billing` - default `BillingActions`

pub mod billing;
pub mod clock;
pub mod http;
pub mod memory;
pub mod postgres;

pub use billing::LoggingBillingActions;
pub use clock::{FixedClock, SystemClock};
pub use memory::InMemoryIdempotencyStore;
pub use postgres::PostgresIdempotencyStore;
