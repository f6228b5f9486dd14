//! IdempotencyStore port - durable processing record per webhook event id.
//!
//! Providers deliver at least once. The store turns that into at most one
//! effective handler run per event id:
//!
//! - `begin` atomically decides whether this delivery owns the event
//! - `commit` records the terminal result of the owned attempt
//!
//! Two concurrent `begin` calls for the same id must never both return
//! `Fresh`. Adapters enforce this with a single lock acquisition (memory)
//! or a single conditional upsert (Postgres). The attempt number returned
//! by `Fresh` is the ownership token `commit` must present, so an attempt
//! that lost its record to a reclaim cannot finish the new owner's record.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::{BeginOutcome, ProcessingRecord, TerminalStatus};

/// Port for tracking which webhook events have been processed.
///
/// # Example
///
/// ```ignore
/// match store.begin(&event.id, &event.event_type, now).await? {
///     BeginOutcome::Fresh { attempt } => {
///         let result = handler.handle(&event).await;
///         store.commit(&event.id, attempt, result.into(), clock.now()).await?;
///     }
///     _ => return Ok(()), // duplicate
/// }
/// ```
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Classify a delivery and, if it may proceed, mark the id `pending`.
    ///
    /// Returns `Fresh` for an unseen id (recording it with
    /// `first_seen_at = now`), for a `failed` id the retry policy still
    /// allows, and for an abandoned `pending` id.
    async fn begin(
        &self,
        event_id: &str,
        event_type: &str,
        now: Timestamp,
    ) -> Result<BeginOutcome, DomainError>;

    /// Move a `pending` record owned by `attempt` to its terminal status.
    ///
    /// A record that is no longer `pending`, or that a later attempt has
    /// reclaimed, is left untouched and `Ok` is returned. An unknown id is
    /// a `NotFound` error.
    async fn commit(
        &self,
        event_id: &str,
        attempt: u32,
        status: TerminalStatus,
        now: Timestamp,
    ) -> Result<(), DomainError>;

    /// Fetch the record for an id.
    async fn find(&self, event_id: &str) -> Result<Option<ProcessingRecord>, DomainError>;

    /// Delete records first seen before `cutoff` (retention).
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
