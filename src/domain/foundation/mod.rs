//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and error types shared by the webhook
//! pipeline and its ports.

mod errors;
mod timestamp;

pub use errors::{DomainError, ErrorCode};
pub use timestamp::Timestamp;
