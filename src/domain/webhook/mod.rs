//! Webhook domain - verified, idempotent ingestion of provider events.
//!
//! A delivery flows through:
//! 1. `SignatureVerifier` - authenticates the raw body
//! 2. `EventParser` - decodes the envelope
//! 3. `IdempotencyStore::begin` - claims the event id
//! 4. `HandlerRegistry` - finds the handler for the event type
//! 5. `IdempotencyStore::commit` - records the outcome
//!
//! `WebhookDispatcher` drives the whole flow and maps the result to a
//! `DispatchOutcome` for the inbound adapter.

mod dispatcher;
mod errors;
mod event;
mod parser;
mod processing;
mod registry;
mod signature;

pub use dispatcher::{DeliveryState, DispatchOutcome, DuplicateReason, RawDelivery, WebhookDispatcher};
pub use errors::{HandlerError, ParseError, VerificationError, WebhookError};
pub use event::{KnownEventType, WebhookEvent};
pub use parser::EventParser;
pub use processing::{
    BeginOutcome, ProcessingRecord, ProcessingStatus, RetryPolicy, TerminalStatus,
    DEFAULT_PENDING_TIMEOUT_SECS, MAX_PENDING_TIMEOUT_SECS, MIN_PENDING_TIMEOUT_SECS,
};
pub use registry::{HandlerFn, HandlerRegistry, WebhookHandler};
pub use signature::{
    compute_signature, sign_header, verify, SignatureHeader, SignatureVerifier, SignedEnvelope,
    VerifierConfig, DEFAULT_TOLERANCE_SECS,
};
