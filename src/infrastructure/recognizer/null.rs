//! No-op recognizer for setups without a speech endpoint

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{RecognizerError, SpeechRecognizer, TranscriptEvent};

/// Recognizer that produces no text.
///
/// Keeps the interview flow identical when no speech endpoint is
/// configured: the event channel opens and closes immediately and
/// every transcript comes back empty.
pub struct NullRecognizer {
    streaming: AtomicBool,
}

impl NullRecognizer {
    pub fn new() -> Self {
        Self {
            streaming: AtomicBool::new(false),
        }
    }
}

impl Default for NullRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechRecognizer for NullRecognizer {
    async fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptEvent>, RecognizerError> {
        let (_tx, rx) = mpsc::unbounded_channel();
        self.streaming.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&self) -> Result<String, RecognizerError> {
        self.streaming.store(false, Ordering::SeqCst);
        Ok(String::new())
    }

    async fn cancel(&self) -> Result<(), RecognizerError> {
        self.streaming.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_no_events_and_an_empty_transcript() {
        let recognizer = NullRecognizer::new();

        let mut events = recognizer.start().await.unwrap();
        assert!(recognizer.is_streaming());
        assert!(events.recv().await.is_none());

        assert_eq!(recognizer.stop().await.unwrap(), "");
        assert!(!recognizer.is_streaming());
    }
}
