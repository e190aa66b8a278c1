//! Chime-and-pace speaker adapter
//!
//! The CLI presents questions as printed text, so "playback" is an
//! attention chime followed by a reading-paced delay. The delay is
//! what gates recording: it scales with question length the way
//! spoken delivery would, and cancel interrupts it immediately.

use std::time::Duration;

use async_trait::async_trait;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use tokio::sync::Notify;

use crate::application::ports::{SpeechError, SpeechSynthesizer};

/// Reading pace per word
const PACE_PER_WORD: Duration = Duration::from_millis(220);

/// Floor so even a one-word prompt gets an audible beat
const MIN_PACE: Duration = Duration::from_millis(1200);

/// Ceiling so long scenario questions do not stall the session
const MAX_PACE: Duration = Duration::from_secs(8);

/// Speaker that marks each question with a tone and paces out its
/// reading time
pub struct ChimeSpeaker {
    chime_enabled: bool,
    cancelled: Notify,
}

impl ChimeSpeaker {
    pub fn new(chime_enabled: bool) -> Self {
        Self {
            chime_enabled,
            cancelled: Notify::new(),
        }
    }

    fn reading_pace(text: &str) -> Duration {
        let words = text.split_whitespace().count() as u32;
        (PACE_PER_WORD * words).clamp(MIN_PACE, MAX_PACE)
    }
}

#[async_trait]
impl SpeechSynthesizer for ChimeSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if self.chime_enabled {
            play_chime().await?;
        }

        let pace = Self::reading_pace(text);
        tokio::select! {
            _ = tokio::time::sleep(pace) => Ok(()),
            _ = self.cancelled.notified() => Err(SpeechError::Cancelled),
        }
    }

    fn cancel(&self) {
        // notify_waiters wakes only an in-flight speak; an idle cancel
        // must not pre-poison the next question's playback
        self.cancelled.notify_waiters();
    }
}

/// Create a gentle tone with fade in for a smoother sound
fn gentle_tone(freq: f32, duration_ms: u64, amplitude: f32) -> impl Source<Item = f32> + Send {
    let fade_ms = (duration_ms / 5).min(30);
    SineWave::new(freq)
        .take_duration(Duration::from_millis(duration_ms))
        .fade_in(Duration::from_millis(fade_ms))
        .amplify(amplitude)
}

async fn play_chime() -> Result<(), SpeechError> {
    // Audio playback runs on a blocking thread to keep the runtime free
    tokio::task::spawn_blocking(play_chime_sync)
        .await
        .map_err(|e| SpeechError::PlaybackFailed(format!("Task join error: {}", e)))?
}

fn play_chime_sync() -> Result<(), SpeechError> {
    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| SpeechError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| SpeechError::PlaybackFailed(e.to_string()))?;

    const AMP: f32 = 0.3;

    // Ascending chime: C5 -> E5, "your question is ready"
    sink.append(gentle_tone(523.0, 80, AMP));
    sink.append(gentle_tone(659.0, 120, AMP));

    sink.sleep_until_end();

    Ok(())
}
