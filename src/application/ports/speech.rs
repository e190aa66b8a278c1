//! Question playback port interface

use async_trait::async_trait;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    #[error("No audio output device available: {0}")]
    DeviceNotAvailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Playback was cancelled")]
    Cancelled,
}

/// Port for presenting a question to the candidate.
///
/// `speak` resolves when playback completes; recording may not begin
/// before that. `cancel` interrupts an in-flight `speak`, which then
/// resolves with `SpeechError::Cancelled`.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Present the question text and resolve when done.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Interrupt an in-flight presentation.
    fn cancel(&self);
}
