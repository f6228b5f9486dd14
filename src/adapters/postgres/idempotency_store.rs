//! PostgreSQL implementation of IdempotencyStore.
//!
//! The primary key on `event_id` provides the atomic insert-if-absent.
//! `begin` is one conditional upsert: it inserts a fresh record, or
//! reclaims a failed/abandoned one, and reports whether it did so through
//! `RETURNING`. Safe across replicas sharing the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::webhook::{
    BeginOutcome, ProcessingRecord, ProcessingStatus, RetryPolicy, TerminalStatus,
};
use crate::ports::IdempotencyStore;

/// PostgreSQL implementation of the IdempotencyStore port.
pub struct PostgresIdempotencyStore {
    pool: PgPool,
    policy: RetryPolicy,
}

impl PostgresIdempotencyStore {
    /// Creates a store with the default retry policy.
    pub fn new(pool: PgPool) -> Self {
        Self::with_policy(pool, RetryPolicy::default())
    }

    pub fn with_policy(pool: PgPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }
}

/// Database row representation of a processing record.
#[derive(Debug, sqlx::FromRow)]
struct ProcessingRow {
    event_id: String,
    event_type: String,
    status: String,
    attempts: i32,
    first_seen_at: DateTime<Utc>,
    last_attempt_at: DateTime<Utc>,
    last_error: Option<String>,
}

impl TryFrom<ProcessingRow> for ProcessingRecord {
    type Error = DomainError;

    fn try_from(row: ProcessingRow) -> Result<Self, Self::Error> {
        let status = ProcessingStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", row.status),
            )
        })?;
        let attempts = u32::try_from(row.attempts).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid attempts value: {}", row.attempts),
            )
        })?;

        Ok(ProcessingRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            first_seen_at: Timestamp::from_datetime(row.first_seen_at),
            status,
            attempts,
            last_attempt_at: Timestamp::from_datetime(row.last_attempt_at),
            last_error: row.last_error,
        })
    }
}

const SELECT_RECORD: &str = r#"
    SELECT event_id, event_type, status, attempts, first_seen_at, last_attempt_at, last_error
    FROM webhook_processing_records
    WHERE event_id = $1
"#;

#[async_trait]
impl IdempotencyStore for PostgresIdempotencyStore {
    async fn begin(
        &self,
        event_id: &str,
        event_type: &str,
        now: Timestamp,
    ) -> Result<BeginOutcome, DomainError> {
        let abandoned_before = self
            .policy
            .abandoned_before(now)
            .map(|cutoff| *cutoff.as_datetime());
        let max_attempts = self
            .policy
            .max_attempts
            .map(|max| i32::try_from(max).unwrap_or(i32::MAX));

        let claimed: Option<(i32,)> = sqlx::query_as(
            r#"
            INSERT INTO webhook_processing_records
                (event_id, event_type, status, attempts, first_seen_at, last_attempt_at)
            VALUES ($1, $2, 'pending', 1, $3, $3)
            ON CONFLICT (event_id) DO UPDATE SET
                status = 'pending',
                attempts = webhook_processing_records.attempts + 1,
                last_attempt_at = EXCLUDED.last_attempt_at,
                completed_at = NULL
            WHERE (
                    webhook_processing_records.status = 'failed'
                    OR (
                        webhook_processing_records.status = 'pending'
                        AND $4::timestamptz IS NOT NULL
                        AND webhook_processing_records.last_attempt_at < $4::timestamptz
                    )
                  )
              AND ($5::int4 IS NULL OR webhook_processing_records.attempts < $5::int4)
            RETURNING attempts
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(*now.as_datetime())
        .bind(abandoned_before)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(event_id = %event_id, error = %e, "Failed to claim webhook event");
            DomainError::database(format!("Failed to claim event: {}", e))
        })?;

        if let Some((attempts,)) = claimed {
            return Ok(BeginOutcome::Fresh {
                attempt: u32::try_from(attempts).unwrap_or(0),
            });
        }

        // Not claimed: classify the existing row without modifying it.
        let mut record = self.find(event_id).await?.ok_or_else(|| {
            DomainError::database(format!("Record for {} vanished during claim", event_id))
        })?;
        match record.try_begin(&self.policy, now) {
            // The row changed between the upsert and the read; another
            // delivery owns it now.
            BeginOutcome::Fresh { .. } => Ok(BeginOutcome::InProgress),
            outcome => Ok(outcome),
        }
    }

    async fn commit(
        &self,
        event_id: &str,
        attempt: u32,
        status: TerminalStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let attempt_column = i32::try_from(attempt).map_err(|_| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Attempt number out of range: {}", attempt),
            )
        })?;

        let result = sqlx::query(
            r#"
            UPDATE webhook_processing_records
            SET status = $2, last_error = $3, completed_at = $4
            WHERE event_id = $1 AND status = 'pending' AND attempts = $5
            "#,
        )
        .bind(event_id)
        .bind(status.status().as_str())
        .bind(status.error())
        .bind(*now.as_datetime())
        .bind(attempt_column)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to commit event: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.find(event_id).await? {
            Some(record) => {
                tracing::warn!(
                    event_id = %event_id,
                    attempt,
                    owner_attempt = record.attempts,
                    current = %record.status,
                    requested = %status.status(),
                    "Ignoring stale commit for a record this attempt no longer owns"
                );
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::NotFound,
                format!("No processing record for event {}", event_id),
            )),
        }
    }

    async fn find(&self, event_id: &str) -> Result<Option<ProcessingRecord>, DomainError> {
        let row: Option<ProcessingRow> = sqlx::query_as(SELECT_RECORD)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to load record: {}", e)))?;

        row.map(ProcessingRecord::try_from).transpose()
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_processing_records WHERE first_seen_at < $1")
            .bind(*cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete records: {}", e)))?;

        Ok(result.rows_affected())
    }
}
