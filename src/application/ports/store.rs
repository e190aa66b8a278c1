//! Durable queue port interface

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::response::{PendingResponse, QueuedMutation, ResponseStatus};

/// Durable store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Local storage quota exceeded")]
    QuotaExceeded,

    #[error("Failed to write queue record: {0}")]
    WriteFailed(String),

    #[error("Failed to read queue record: {0}")]
    ReadFailed(String),

    #[error("Queue record not found: {0}")]
    NotFound(Uuid),

    #[error("Corrupted queue record: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Quota failures are surfaced differently from sync failures:
    /// the session continues, but the answer is not durably protected.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

/// Port for the crash-resistant local queue of responses and generic
/// mutations.
///
/// `enqueue` is an insert-or-replace on the (questionId, sessionId)
/// key, so a re-recorded answer overwrites the previous one instead
/// of duplicating it.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Insert or replace the response for its idempotency key.
    async fn enqueue(&self, response: &PendingResponse) -> Result<(), StoreError>;

    /// All responses not yet confirmed by the server, ordered by
    /// recording time ascending. Includes `failed` records (visible
    /// for manual retry) and any `syncing` record orphaned by a
    /// crash mid-drain.
    async fn list_pending(&self) -> Result<Vec<PendingResponse>, StoreError>;

    /// Update a record's status. A transition to `failed` increments
    /// its retry count.
    async fn mark_status(
        &self,
        id: Uuid,
        status: ResponseStatus,
        error: Option<String>,
    ) -> Result<(), StoreError>;

    /// Delete a record once the server has acknowledged it.
    async fn remove(&self, id: Uuid) -> Result<(), StoreError>;

    /// Count records currently in the given status.
    async fn count(&self, status: ResponseStatus) -> Result<usize, StoreError>;

    /// Queue a generic mutation for later replay.
    async fn enqueue_mutation(&self, mutation: &QueuedMutation) -> Result<(), StoreError>;

    /// All queued mutations in creation order.
    async fn list_mutations(&self) -> Result<Vec<QueuedMutation>, StoreError>;

    /// Record a failed delivery attempt on a mutation.
    async fn mark_mutation_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError>;

    /// Delete a delivered mutation.
    async fn remove_mutation(&self, id: Uuid) -> Result<(), StoreError>;
}
