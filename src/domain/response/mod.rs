//! Pending response and retry-queue entities

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::recording::AudioClip;

/// Sync status of a locally held response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl ResponseStatus {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The idempotency key: at most one not-yet-synced response may exist
/// per (question, session) pair, and the server upserts on the same
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseKey {
    pub session_id: Uuid,
    pub question_id: Uuid,
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.question_id)
    }
}

/// One recorded answer awaiting server confirmation.
///
/// Created the instant recording stops, deleted the instant the server
/// acknowledges it. The server's response table, not this record, is
/// the durable record of success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingResponse {
    /// Locally generated, stable across retries
    pub id: Uuid,
    pub question_id: Uuid,
    pub session_id: Uuid,
    pub audio: AudioClip,
    /// May be empty if transcription failed or produced nothing
    pub transcript: String,
    pub duration_secs: u32,
    pub recorded_at: DateTime<Utc>,
    pub status: ResponseStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl PendingResponse {
    /// Create a pending response for a just-stopped recording
    pub fn new(
        question_id: Uuid,
        session_id: Uuid,
        audio: AudioClip,
        transcript: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            session_id,
            audio,
            transcript: transcript.into(),
            duration_secs,
            recorded_at: Utc::now(),
            status: ResponseStatus::Pending,
            retry_count: 0,
            last_error: None,
        }
    }

    /// The idempotency key for this response
    pub fn key(&self) -> ResponseKey {
        ResponseKey {
            session_id: self.session_id,
            question_id: self.question_id,
        }
    }

    /// Apply a status transition. A transition to `failed` increments
    /// the retry count; other transitions leave it untouched.
    pub fn apply_status(&mut self, status: ResponseStatus, error: Option<String>) {
        if status == ResponseStatus::Failed {
            self.retry_count += 1;
        }
        if error.is_some() {
            self.last_error = error;
        }
        self.status = status;
    }

    /// Whether automatic drains should skip this record
    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.retry_count >= max_attempts
    }
}

/// Kinds of non-response mutations that must survive a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationKind {
    /// Ask the server to batch-evaluate all unscored responses of a
    /// session. Idempotent server-side.
    #[serde(rename_all = "camelCase")]
    TriggerEvaluation { session_id: Uuid },
}

impl MutationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TriggerEvaluation { .. } => "triggerEvaluation",
        }
    }
}

/// Generic envelope for a queued mutation, sharing the response
/// queue's retry discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMutation {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: MutationKind,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl QueuedMutation {
    /// Create a mutation envelope with zero attempts
    pub fn new(kind: MutationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            created_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }

    /// Record a failed attempt
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.attempts += 1;
        self.last_error = Some(error.into());
    }

    /// Whether automatic drains should skip this mutation
    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}
