//! In-memory implementation of IdempotencyStore.
//!
//! Suitable for a single process. Records are lost on restart, so a
//! redelivery after a restart runs its handler again.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhook::{BeginOutcome, ProcessingRecord, RetryPolicy, TerminalStatus};
use crate::ports::IdempotencyStore;

/// Mutex-guarded map of processing records keyed by event id.
///
/// `begin` performs its check-and-insert under a single lock acquisition,
/// and the lock is never held across any other await.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<String, ProcessingRecord>>,
    policy: RetryPolicy,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn begin(
        &self,
        event_id: &str,
        event_type: &str,
        now: Timestamp,
    ) -> Result<BeginOutcome, DomainError> {
        let mut records = self.records.lock().await;

        match records.get_mut(event_id) {
            Some(record) => Ok(record.try_begin(&self.policy, now)),
            None => {
                records.insert(
                    event_id.to_string(),
                    ProcessingRecord::first_attempt(event_id, event_type, now),
                );
                Ok(BeginOutcome::Fresh { attempt: 1 })
            }
        }
    }

    async fn commit(
        &self,
        event_id: &str,
        attempt: u32,
        status: TerminalStatus,
        _now: Timestamp,
    ) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;

        let record = records.get_mut(event_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::NotFound,
                format!("No processing record for event {}", event_id),
            )
        })?;

        if !record.complete(attempt, &status) {
            tracing::warn!(
                event_id = %event_id,
                attempt,
                owner_attempt = record.attempts,
                current = %record.status,
                requested = %status.status(),
                "Ignoring stale commit for a record this attempt no longer owns"
            );
        }
        Ok(())
    }

    async fn find(&self, event_id: &str) -> Result<Option<ProcessingRecord>, DomainError> {
        Ok(self.records.lock().await.get(event_id).cloned())
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.first_seen_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}
