//! Audio capture port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::recording::AudioClip;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No audio input device available")]
    DeviceUnavailable,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to read captured audio: {0}")]
    ReadFailed(String),

    #[error("Failed to encode captured audio: {0}")]
    EncodingFailed(String),
}

/// One block of captured audio on the live tap.
/// Mono i16 samples; the rate is whatever the device delivered.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

/// Port for microphone capture of one answer at a time.
///
/// `stop()` must succeed even when nothing was captured, returning a
/// zero-length clip; saying nothing in time is a legitimate answer.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Acquire the microphone and start buffering audio.
    async fn start(&self) -> Result<(), CaptureError>;

    /// Stop capturing, release the microphone, and return the
    /// buffered audio as a single encoded clip.
    async fn stop(&self) -> Result<AudioClip, CaptureError>;

    /// Stop capturing and discard everything buffered.
    async fn cancel(&self) -> Result<(), CaptureError>;

    /// Check if currently capturing
    fn is_active(&self) -> bool;

    /// Subscribe to the live frame tap, published while capture is
    /// active. Lets the recognition adapter share the one microphone
    /// handle. A lagging subscriber loses frames, never stalls
    /// capture.
    fn frames(&self) -> broadcast::Receiver<AudioFrame>;
}
