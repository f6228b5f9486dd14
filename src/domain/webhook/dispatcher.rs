//! Webhook dispatcher - drives one delivery through the pipeline.
//!
//! ## State machine
//!
//! ```text
//! Received → Verifying → (Rejected | Verified) → DedupCheck
//!          → (Duplicate | Fresh) → Routing → (NoHandler | Routed)
//!          → Invoking → (Succeeded | Failed)
//! ```
//!
//! Terminal states map to exactly one response class:
//! `Rejected` → client error, `Duplicate`/`Succeeded` → success,
//! `Failed` → server error.
//!
//! ## Race Condition Handling
//!
//! Concurrent deliveries of one event id race on `IdempotencyStore::begin`.
//! Exactly one wins `Fresh`; the others see `InProgress` and are
//! acknowledged without running the handler. The `pending` record is the
//! concurrency token: no lock is held while the handler runs.
//!
//! ## Cancellation
//!
//! Invocation and commit run on a detached task, so a dropped request
//! future does not abort a handler halfway through its side effects.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use futures::FutureExt;

use super::errors::{HandlerError, WebhookError};
use super::event::WebhookEvent;
use super::parser::EventParser;
use super::processing::{BeginOutcome, TerminalStatus};
use super::registry::{HandlerRegistry, WebhookHandler};
use super::signature::SignatureVerifier;
use crate::domain::foundation::Timestamp;
use crate::ports::{Clock, IdempotencyStore};

/// One HTTP transmission, exactly as received.
#[derive(Debug, Clone)]
pub struct RawDelivery {
    /// The exact wire body. Never re-serialized before verification.
    pub body: Bytes,
    /// Value of the signature header, if present.
    pub signature: Option<String>,
    pub received_at: Timestamp,
}

impl RawDelivery {
    pub fn new(body: impl Into<Bytes>, signature: Option<String>, received_at: Timestamp) -> Self {
        Self {
            body: body.into(),
            signature,
            received_at,
        }
    }
}

/// Pipeline states, emitted as the `state` field of debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Received,
    Verifying,
    Rejected,
    Verified,
    DedupCheck,
    Duplicate,
    Fresh,
    Routing,
    NoHandler,
    Routed,
    Invoking,
    Succeeded,
    Failed,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Received => "received",
            DeliveryState::Verifying => "verifying",
            DeliveryState::Rejected => "rejected",
            DeliveryState::Verified => "verified",
            DeliveryState::DedupCheck => "dedup_check",
            DeliveryState::Duplicate => "duplicate",
            DeliveryState::Fresh => "fresh",
            DeliveryState::Routing => "routing",
            DeliveryState::NoHandler => "no_handler",
            DeliveryState::Routed => "routed",
            DeliveryState::Invoking => "invoking",
            DeliveryState::Succeeded => "succeeded",
            DeliveryState::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a delivery was acknowledged without running a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    AlreadySucceeded,
    InProgress,
    /// The retry policy allows no further attempts for this id.
    AttemptsExhausted,
}

impl DuplicateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateReason::AlreadySucceeded => "already_succeeded",
            DuplicateReason::InProgress => "in_progress",
            DuplicateReason::AttemptsExhausted => "attempts_exhausted",
        }
    }
}

/// Terminal result of a delivery.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Verification or parsing failed. Nothing was recorded.
    Rejected { error: WebhookError },
    /// The event id was already handled or is being handled.
    Duplicate {
        event_id: String,
        reason: DuplicateReason,
    },
    /// The event was committed as succeeded. `handled` is false when no
    /// handler is registered for its type.
    Succeeded { event_id: String, handled: bool },
    /// The handler or the store failed; the provider should retry.
    Failed {
        event_id: String,
        error: WebhookError,
    },
}

impl DispatchOutcome {
    /// HTTP status the inbound adapter should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchOutcome::Rejected { error } | DispatchOutcome::Failed { error, .. } => {
                error.status_code()
            }
            DispatchOutcome::Duplicate { .. } | DispatchOutcome::Succeeded { .. } => {
                StatusCode::OK
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Duplicate { .. } | DispatchOutcome::Succeeded { .. }
        )
    }

    /// Event id, once the body has been parsed.
    pub fn event_id(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Rejected { .. } => None,
            DispatchOutcome::Duplicate { event_id, .. }
            | DispatchOutcome::Succeeded { event_id, .. }
            | DispatchOutcome::Failed { event_id, .. } => Some(event_id),
        }
    }

    pub fn error(&self) -> Option<&WebhookError> {
        match self {
            DispatchOutcome::Rejected { error } | DispatchOutcome::Failed { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }

    /// Terminal state name.
    pub fn state(&self) -> DeliveryState {
        match self {
            DispatchOutcome::Rejected { .. } => DeliveryState::Rejected,
            DispatchOutcome::Duplicate { .. } => DeliveryState::Duplicate,
            DispatchOutcome::Succeeded { .. } => DeliveryState::Succeeded,
            DispatchOutcome::Failed { .. } => DeliveryState::Failed,
        }
    }
}

/// Orchestrates verify → parse → dedup → route → invoke → commit.
pub struct WebhookDispatcher {
    verifier: SignatureVerifier,
    store: Arc<dyn IdempotencyStore>,
    registry: Arc<HandlerRegistry>,
    clock: Arc<dyn Clock>,
}

impl WebhookDispatcher {
    pub fn new(
        verifier: SignatureVerifier,
        store: Arc<dyn IdempotencyStore>,
        registry: Arc<HandlerRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            store,
            registry,
            clock,
        }
    }

    /// Captures a delivery stamped with the dispatcher's clock.
    pub fn receive(&self, body: impl Into<Bytes>, signature: Option<String>) -> RawDelivery {
        RawDelivery::new(body, signature, self.clock.now())
    }

    /// Runs one delivery to a terminal state.
    ///
    /// Never fails: every error is folded into the returned outcome.
    pub async fn dispatch(&self, delivery: RawDelivery) -> DispatchOutcome {
        let body_len = delivery.body.len();
        let now = delivery.received_at;
        tracing::debug!(state = %DeliveryState::Received, body_len, "Webhook delivery received");

        tracing::debug!(state = %DeliveryState::Verifying, "Verifying webhook signature");
        let envelope = match self
            .verifier
            .verify(delivery.body, delivery.signature.as_deref(), now)
        {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(
                    state = %DeliveryState::Rejected,
                    error = %err,
                    body_len,
                    "Webhook signature verification failed"
                );
                return DispatchOutcome::Rejected { error: err.into() };
            }
        };

        let event = match EventParser::parse(&envelope) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    state = %DeliveryState::Rejected,
                    error = %err,
                    body_len,
                    "Verified webhook body could not be parsed"
                );
                return DispatchOutcome::Rejected { error: err.into() };
            }
        };
        tracing::debug!(
            state = %DeliveryState::Verified,
            event_id = %event.id,
            event_type = %event.event_type,
            "Webhook verified"
        );

        tracing::debug!(state = %DeliveryState::DedupCheck, event_id = %event.id, "Claiming event");
        let attempt = match self.store.begin(&event.id, &event.event_type, now).await {
            Ok(BeginOutcome::Fresh { attempt }) => attempt,
            Ok(BeginOutcome::AlreadySucceeded) => {
                return duplicate(event.id, DuplicateReason::AlreadySucceeded)
            }
            Ok(BeginOutcome::InProgress) => {
                return duplicate(event.id, DuplicateReason::InProgress)
            }
            Ok(BeginOutcome::AttemptsExhausted { attempts }) => {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    attempts,
                    "Webhook retries exhausted; acknowledging without handling"
                );
                return duplicate(event.id, DuplicateReason::AttemptsExhausted);
            }
            Err(err) => {
                tracing::error!(
                    state = %DeliveryState::Failed,
                    event_id = %event.id,
                    error = %err,
                    "Idempotency store unavailable"
                );
                return DispatchOutcome::Failed {
                    event_id: event.id,
                    error: WebhookError::Store(err),
                };
            }
        };
        tracing::debug!(state = %DeliveryState::Fresh, event_id = %event.id, attempt, "Event claimed");

        tracing::debug!(state = %DeliveryState::Routing, event_type = %event.event_type, "Routing event");
        let handler = self.registry.lookup(&event.event_type);
        let event_id = event.id.clone();
        let attempt_task = tokio::spawn(run_attempt(
            self.store.clone(),
            self.clock.clone(),
            handler,
            event,
            attempt,
        ));

        match attempt_task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                tracing::error!(event_id = %event_id, error = %join_err, "Webhook attempt task aborted");
                DispatchOutcome::Failed {
                    event_id,
                    error: HandlerError::Panicked(join_err.to_string()).into(),
                }
            }
        }
    }
}

impl fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("verifier", &self.verifier)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn duplicate(event_id: String, reason: DuplicateReason) -> DispatchOutcome {
    tracing::info!(
        state = %DeliveryState::Duplicate,
        event_id = %event_id,
        reason = reason.as_str(),
        "Duplicate webhook delivery acknowledged"
    );
    DispatchOutcome::Duplicate { event_id, reason }
}

/// Invoke (if routed) and commit as `attempt`. Runs on its own task.
async fn run_attempt(
    store: Arc<dyn IdempotencyStore>,
    clock: Arc<dyn Clock>,
    handler: Option<Arc<dyn WebhookHandler>>,
    event: WebhookEvent,
    attempt: u32,
) -> DispatchOutcome {
    let Some(handler) = handler else {
        tracing::debug!(
            state = %DeliveryState::NoHandler,
            event_id = %event.id,
            event_type = %event.event_type,
            "No handler registered; acknowledging"
        );
        return commit_success(store.as_ref(), clock.as_ref(), event.id, attempt, false).await;
    };

    tracing::debug!(state = %DeliveryState::Routed, event_id = %event.id, "Handler found");
    tracing::debug!(state = %DeliveryState::Invoking, event_id = %event.id, "Invoking handler");

    let result = match AssertUnwindSafe(handler.handle(&event)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(HandlerError::Panicked(panic_message(&*panic))),
    };

    match result {
        Ok(()) => commit_success(store.as_ref(), clock.as_ref(), event.id, attempt, true).await,
        Err(err) => {
            tracing::error!(
                state = %DeliveryState::Failed,
                event_id = %event.id,
                event_type = %event.event_type,
                error = %err,
                "Webhook handler failed"
            );
            let status = TerminalStatus::Failed {
                error: err.to_string(),
            };
            if let Err(store_err) = store.commit(&event.id, attempt, status, clock.now()).await {
                tracing::error!(
                    event_id = %event.id,
                    error = %store_err,
                    "Failed to record handler failure"
                );
            }
            DispatchOutcome::Failed {
                event_id: event.id,
                error: err.into(),
            }
        }
    }
}

async fn commit_success(
    store: &dyn IdempotencyStore,
    clock: &dyn Clock,
    event_id: String,
    attempt: u32,
    handled: bool,
) -> DispatchOutcome {
    match store
        .commit(&event_id, attempt, TerminalStatus::Succeeded, clock.now())
        .await
    {
        Ok(()) => {
            tracing::debug!(
                state = %DeliveryState::Succeeded,
                event_id = %event_id,
                handled,
                "Webhook processed"
            );
            DispatchOutcome::Succeeded { event_id, handled }
        }
        Err(err) => {
            tracing::error!(
                state = %DeliveryState::Failed,
                event_id = %event_id,
                error = %err,
                "Failed to record webhook success"
            );
            DispatchOutcome::Failed {
                event_id,
                error: WebhookError::Store(err),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "handler panicked".to_string()
    }
}
