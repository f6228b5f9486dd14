//! Clock port - source of "now" for the webhook pipeline.

use crate::domain::foundation::Timestamp;

/// Current time provider.
///
/// The dispatcher reads the clock once per delivery and threads the value
/// through verification and the idempotency store, so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
