//! In-memory adapters for single-process deployments and tests.

mod idempotency_store;

pub use idempotency_store::InMemoryIdempotencyStore;
