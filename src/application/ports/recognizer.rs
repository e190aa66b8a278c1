//! Live speech recognition port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Recognition errors
#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    #[error("Failed to open recognition stream: {0}")]
    StartFailed(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Recognition request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse recognition response: {0}")]
    ParseError(String),
}

/// One tagged event on the recognition stream.
///
/// Interim text is a display-only preview and is replaced wholesale
/// by the next event; final text is append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Interim(String),
    Final(String),
    Error(String),
}

/// Port for continuous speech-to-text running alongside capture.
///
/// Consumers read the event channel in an explicit loop; the channel
/// closes when the stream stops. `stop()` returns the concatenation
/// of all finalized segments, single-space separated.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Open the recognition stream. Events arrive on the returned
    /// channel until the stream is stopped or cancelled.
    async fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptEvent>, RecognizerError>;

    /// Close the stream and return the finalized transcript.
    /// An empty string is a valid result.
    async fn stop(&self) -> Result<String, RecognizerError>;

    /// Close the stream and discard all accumulated text.
    async fn cancel(&self) -> Result<(), RecognizerError>;

    /// Check if a stream is open
    fn is_streaming(&self) -> bool;
}
