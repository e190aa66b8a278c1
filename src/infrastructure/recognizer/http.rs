//! HTTP speech recognition adapter
//!
//! Streams the microphone to the speech endpoint as a growing window:
//! every couple of seconds the audio accumulated since the last
//! finalized segment is re-sent in full, and the response text
//! replaces the interim preview. When the service marks a response
//! final, or the window ages out, the text is committed and the
//! window restarts empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex as TokioMutex};
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::{AudioFrame, RecognizerError, SpeechRecognizer, TranscriptEvent};
use crate::domain::transcript::Transcript;
use crate::infrastructure::capture::encode_flac_at;

/// How often the current window is re-submitted for recognition
const DEFAULT_WINDOW_INTERVAL: Duration = Duration::from_secs(2);

/// A window older than this is committed whether or not the service
/// considers it a complete utterance, so interim text and window
/// memory cannot grow without bound
const WINDOW_MAX_AGE: Duration = Duration::from_secs(30);

/// Per-request timeout, short because a stale interim result is
/// worthless by the time it arrives
const RECOGNITION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    /// Base64 FLAC of the full current window
    audio: String,
    sample_rate: u32,
    /// True when the client will not extend this window again
    finalize: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeResponse {
    text: String,
    #[serde(default)]
    is_final: bool,
}

#[derive(Debug, Clone, Copy)]
enum StopMode {
    Flush,
    Discard,
}

/// Everything a stream worker needs to talk to the service
#[derive(Clone)]
struct StreamContext {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    window_interval: Duration,
}

struct StreamHandle {
    stop: oneshot::Sender<StopMode>,
    worker: tokio::task::JoinHandle<String>,
}

/// Live recognizer backed by the practice server's speech endpoint
pub struct HttpRecognizer {
    context: StreamContext,
    /// Prototype subscription to the capture tap; each stream
    /// resubscribes so it only sees frames from its own recording
    frames: broadcast::Receiver<AudioFrame>,
    streaming: AtomicBool,
    session: TokioMutex<Option<StreamHandle>>,
}

impl HttpRecognizer {
    /// Create a recognizer posting to the given endpoint
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        frames: broadcast::Receiver<AudioFrame>,
    ) -> Self {
        Self::with_window(endpoint, api_key, frames, DEFAULT_WINDOW_INTERVAL)
    }

    /// Create a recognizer with a custom re-submission cadence
    pub fn with_window(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        frames: broadcast::Receiver<AudioFrame>,
        window_interval: Duration,
    ) -> Self {
        Self {
            context: StreamContext {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                api_key,
                window_interval,
            },
            frames,
            streaming: AtomicBool::new(false),
            session: TokioMutex::new(None),
        }
    }
}

impl StreamContext {
    /// Encode one window and submit it for recognition
    async fn recognize(
        &self,
        samples: Vec<i16>,
        sample_rate: u32,
        finalize: bool,
    ) -> Result<RecognizeResponse, RecognizerError> {
        let flac = tokio::task::spawn_blocking(move || encode_flac_at(&samples, sample_rate))
            .await
            .map_err(|e| RecognizerError::RequestFailed(e.to_string()))?
            .map_err(|e| RecognizerError::RequestFailed(e.to_string()))?;

        let body = RecognizeRequest {
            audio: base64::engine::general_purpose::STANDARD.encode(&flac),
            sample_rate,
            finalize,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(RECOGNITION_TIMEOUT);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RecognizerError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RecognizerError::InvalidApiKey);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RecognizerError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RecognizerError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RecognizerError::ParseError(e.to_string()))
    }
}

/// Stream worker owning the window buffer and the event channel.
/// Returns the finalized transcript when stopped with a flush.
async fn stream_worker(
    context: StreamContext,
    mut frames: broadcast::Receiver<AudioFrame>,
    events: mpsc::UnboundedSender<TranscriptEvent>,
    mut stop: oneshot::Receiver<StopMode>,
) -> String {
    let mut transcript = Transcript::new();
    let mut window: Vec<i16> = Vec::new();
    let mut window_rate: u32 = 0;
    let mut window_opened = Instant::now();
    let mut frames_open = true;

    let mut ticker = tokio::time::interval(context.window_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately, before any audio exists
    ticker.tick().await;

    loop {
        tokio::select! {
            frame = frames.recv(), if frames_open => match frame {
                Ok(frame) => {
                    if window.is_empty() {
                        window_opened = Instant::now();
                    }
                    window_rate = frame.sample_rate;
                    window.extend_from_slice(&frame.samples);
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Dropped frames only degrade the preview; the
                    // stored answer comes from the capture buffer
                }
                Err(broadcast::error::RecvError::Closed) => {
                    frames_open = false;
                }
            },
            _ = ticker.tick() => {
                if window.is_empty() {
                    continue;
                }
                let expired = window_opened.elapsed() >= WINDOW_MAX_AGE;
                match context.recognize(window.clone(), window_rate, expired).await {
                    Ok(result) => {
                        let text = result.text.trim().to_string();
                        if result.is_final || expired {
                            window.clear();
                            if !text.is_empty() {
                                transcript.push_final(&text);
                                let _ = events.send(TranscriptEvent::Final(text));
                            }
                        } else if !text.is_empty() {
                            let _ = events.send(TranscriptEvent::Interim(text));
                        }
                    }
                    Err(e) => {
                        let _ = events.send(TranscriptEvent::Error(e.to_string()));
                        if expired {
                            // Recognition is best-effort. A window the
                            // service never accepted is dropped once it
                            // ages out, keeping memory bounded.
                            window.clear();
                        }
                    }
                }
            }
            mode = &mut stop => {
                // A dropped sender means the recognizer went away;
                // treat it like a cancel
                let mode = mode.unwrap_or(StopMode::Discard);
                if let StopMode::Discard = mode {
                    return String::new();
                }

                if !window.is_empty() {
                    match context.recognize(window.clone(), window_rate, true).await {
                        Ok(result) => {
                            let text = result.text.trim().to_string();
                            if !text.is_empty() {
                                transcript.push_final(&text);
                                let _ = events.send(TranscriptEvent::Final(text));
                            }
                        }
                        Err(e) => {
                            let _ = events.send(TranscriptEvent::Error(e.to_string()));
                        }
                    }
                }
                return transcript.final_text();
            }
        }
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn start(&self) -> Result<mpsc::UnboundedReceiver<TranscriptEvent>, RecognizerError> {
        let mut session = self.session.lock().await;
        if session.is_some() {
            return Err(RecognizerError::StartFailed(
                "recognition stream already open".to_string(),
            ));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let worker = tokio::spawn(stream_worker(
            self.context.clone(),
            self.frames.resubscribe(),
            events_tx,
            stop_rx,
        ));

        *session = Some(StreamHandle {
            stop: stop_tx,
            worker,
        });
        self.streaming.store(true, Ordering::SeqCst);
        Ok(events_rx)
    }

    async fn stop(&self) -> Result<String, RecognizerError> {
        let handle = self.session.lock().await.take();
        self.streaming.store(false, Ordering::SeqCst);

        let Some(handle) = handle else {
            return Ok(String::new());
        };

        let _ = handle.stop.send(StopMode::Flush);
        handle
            .worker
            .await
            .map_err(|e| RecognizerError::RequestFailed(e.to_string()))
    }

    async fn cancel(&self) -> Result<(), RecognizerError> {
        let handle = self.session.lock().await.take();
        self.streaming.store(false, Ordering::SeqCst);

        if let Some(handle) = handle {
            let _ = handle.stop.send(StopMode::Discard);
            let _ = handle.worker.await;
        }
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}
