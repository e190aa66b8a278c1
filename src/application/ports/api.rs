//! Remote response endpoint port interface

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::response::PendingResponse;

/// Remote API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Failed to build request: {0}")]
    InvalidRequest(String),

    #[error("Failed to parse server response: {0}")]
    ParseError(String),
}

/// Port for the remote response store.
///
/// Both calls are idempotent server-side: a response submission
/// upserts on (questionId, sessionId), and an evaluation trigger
/// returns the cached result when one already exists. Retrying after
/// a crash therefore overwrites, never duplicates.
#[async_trait]
pub trait ResponseApi: Send + Sync {
    /// Upload one recorded answer (multipart: metadata, transcript,
    /// audio).
    async fn submit_response(&self, response: &PendingResponse) -> Result<(), ApiError>;

    /// Ask the server to batch-evaluate a session's unscored
    /// responses.
    async fn trigger_evaluation(&self, session_id: Uuid) -> Result<(), ApiError>;
}
