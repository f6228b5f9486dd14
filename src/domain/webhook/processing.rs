//! Processing records - one per webhook event id ever accepted.
//!
//! Status only moves `pending → succeeded` or `pending → failed`. A failed
//! record goes back to `pending` when a redelivery starts a new attempt;
//! a succeeded record is final and short-circuits every later delivery.
//!
//! The attempt counter doubles as an ownership token: only the attempt
//! that currently owns a `pending` record may complete it. An attempt
//! whose record was reclaimed after the pending timeout can no longer
//! change it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Default age after which a `pending` record is considered abandoned.
pub const DEFAULT_PENDING_TIMEOUT_SECS: u64 = 30 * 60;

/// Shortest accepted pending timeout. Shorter values would reclaim
/// attempts whose handler is still running.
pub const MIN_PENDING_TIMEOUT_SECS: u64 = 5 * 60;

/// Longest accepted pending timeout.
pub const MAX_PENDING_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Processing status of an event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Succeeded,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Succeeded => "succeeded",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProcessingStatus::Pending),
            "succeeded" => Some(ProcessingStatus::Succeeded),
            "failed" => Some(ProcessingStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one attempt, passed to `IdempotencyStore::commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    Failed { error: String },
}

impl TerminalStatus {
    pub fn status(&self) -> ProcessingStatus {
        match self {
            TerminalStatus::Succeeded => ProcessingStatus::Succeeded,
            TerminalStatus::Failed { .. } => ProcessingStatus::Failed,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TerminalStatus::Succeeded => None,
            TerminalStatus::Failed { error } => Some(error),
        }
    }
}

/// Result of `IdempotencyStore::begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// This delivery owns the event; `attempt` is 1 on first sight.
    Fresh { attempt: u32 },
    /// The event was already applied.
    AlreadySucceeded,
    /// Another delivery of the same event is mid-flight.
    InProgress,
    /// The last attempt failed and the retry policy allows no more.
    AttemptsExhausted { attempts: u32 },
}

/// How failed and abandoned records may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Cap on handler attempts per event id; `None` means unlimited.
    pub max_attempts: Option<u32>,
    /// Age after which a `pending` record may be reclaimed; `None` never reclaims.
    pub pending_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            pending_timeout: Some(Duration::from_secs(DEFAULT_PENDING_TIMEOUT_SECS)),
        }
    }
}

impl RetryPolicy {
    /// Returns true if another attempt may start after `attempts` attempts.
    pub fn allows_attempt(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Returns true if a pending attempt started at `started_at` is abandoned.
    pub fn is_abandoned(&self, started_at: Timestamp, now: Timestamp) -> bool {
        match self.timeout_secs() {
            Some(timeout) => now.duration_since(&started_at).num_seconds() > timeout,
            None => false,
        }
    }

    /// Cutoff before which a pending attempt counts as abandoned.
    ///
    /// `None` when nothing is ever reclaimed, including a timeout too large
    /// to represent.
    pub fn abandoned_before(&self, now: Timestamp) -> Option<Timestamp> {
        self.timeout_secs()
            .and_then(|timeout| now.checked_minus_secs(timeout))
    }

    fn timeout_secs(&self) -> Option<i64> {
        self.pending_timeout
            .and_then(|timeout| i64::try_from(timeout.as_secs()).ok())
    }
}

/// One row per accepted event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub event_id: String,
    pub event_type: String,
    pub first_seen_at: Timestamp,
    pub status: ProcessingStatus,
    /// Handler attempts started for this id.
    pub attempts: u32,
    pub last_attempt_at: Timestamp,
    pub last_error: Option<String>,
}

impl ProcessingRecord {
    /// Record for the first delivery of an event.
    pub fn first_attempt(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            first_seen_at: now,
            status: ProcessingStatus::Pending,
            attempts: 1,
            last_attempt_at: now,
            last_error: None,
        }
    }

    /// Classifies a new delivery against this record.
    ///
    /// When the delivery may proceed the record is moved back to `pending`
    /// and its attempt counter incremented.
    pub fn try_begin(&mut self, policy: &RetryPolicy, now: Timestamp) -> BeginOutcome {
        let reclaimable = match self.status {
            ProcessingStatus::Succeeded => return BeginOutcome::AlreadySucceeded,
            ProcessingStatus::Failed => true,
            ProcessingStatus::Pending => policy.is_abandoned(self.last_attempt_at, now),
        };

        if !reclaimable {
            return BeginOutcome::InProgress;
        }
        if !policy.allows_attempt(self.attempts) {
            return BeginOutcome::AttemptsExhausted {
                attempts: self.attempts,
            };
        }

        self.status = ProcessingStatus::Pending;
        self.attempts += 1;
        self.last_attempt_at = now;
        BeginOutcome::Fresh {
            attempt: self.attempts,
        }
    }

    /// Applies the terminal status of `attempt`.
    ///
    /// Returns false and changes nothing unless the record is `pending` and
    /// `attempt` is the attempt that currently owns it.
    pub fn complete(&mut self, attempt: u32, outcome: &TerminalStatus) -> bool {
        if self.status != ProcessingStatus::Pending || self.attempts != attempt {
            return false;
        }
        self.status = outcome.status();
        self.last_error = outcome.error().map(str::to_string);
        true
    }
}
