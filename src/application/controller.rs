//! Interview session use case

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

use crate::domain::interview::{Advance, Countdown, InterviewPhase, InterviewProgress, StopReason};
use crate::domain::recording::{AudioClip, AudioFormat};
use crate::domain::response::{MutationKind, PendingResponse, QueuedMutation};
use crate::domain::session::{Question, Session};
use crate::domain::transcript::Transcript;

use super::ports::{
    AudioCapture, ResponseApi, ResponseStore, SpeechError, SpeechRecognizer, SpeechSynthesizer,
    TranscriptEvent,
};
use super::sync::SyncEngine;

/// Everything needed to run one rehearsal session
pub struct InterviewPlan {
    pub session: Session,
    pub questions: Vec<Question>,
    /// Overrides every question's derived time limit when set
    pub time_limit_override: Option<u32>,
}

/// Events published to the presentation layer.
///
/// Adapter failures surface here instead of as errors: the session
/// keeps moving and the UI decides how loudly to complain.
#[derive(Debug, Clone)]
pub enum InterviewEvent {
    PhaseChanged {
        phase: InterviewPhase,
    },
    QuestionPresented {
        index: usize,
        total: usize,
        question: Question,
    },
    /// Playback finished (or was not needed); recording may begin
    PlaybackFinished {
        index: usize,
    },
    PlaybackFailed {
        message: String,
    },
    CountdownTick {
        elapsed_secs: u32,
        remaining_secs: u32,
        limit_secs: u32,
    },
    TranscriptUpdated {
        snapshot: String,
    },
    RecordingStopped {
        reason: StopReason,
        duration_secs: u32,
        audio_size: String,
    },
    /// The answer reached the durable queue
    ResponseQueued {
        question_id: Uuid,
        pending_count: usize,
    },
    /// The answer could not be written locally and is not protected
    PersistFailed {
        message: String,
        quota: bool,
    },
    CaptureFailed {
        message: String,
    },
    TranscriptionFailed {
        message: String,
    },
    SessionCompleted {
        answered: usize,
        skipped: usize,
    },
}

struct ControllerState {
    session: Session,
    progress: InterviewProgress,
    countdown: Countdown,
    live: Transcript,
}

struct ControllerInner<C, R, P, S, A> {
    capture: C,
    recognizer: R,
    speaker: P,
    store: Arc<S>,
    sync: SyncEngine<S, A>,
    online: watch::Receiver<bool>,
    questions: Vec<Question>,
    time_limit_override: Option<u32>,
    state: Mutex<ControllerState>,
    /// Identifies the current recording attempt. Spawned countdown and
    /// transcript tasks carry the epoch they were started under and
    /// exit as soon as it no longer matches, so a stale task can never
    /// touch a later attempt.
    epoch: AtomicU64,
    events: mpsc::UnboundedSender<InterviewEvent>,
}

/// Drives one interview session across its phases.
///
/// All mutating calls are no-ops outside the phase they apply to, so
/// duplicate or late UI events cannot corrupt the session. The state
/// lock is held across adapter calls within one operation; concurrent
/// operations serialize behind it.
pub struct InterviewController<C, R, P, S, A> {
    inner: Arc<ControllerInner<C, R, P, S, A>>,
}

impl<C, R, P, S, A> Clone for InterviewController<C, R, P, S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, R, P, S, A> InterviewController<C, R, P, S, A>
where
    C: AudioCapture + 'static,
    R: SpeechRecognizer + 'static,
    P: SpeechSynthesizer + 'static,
    S: ResponseStore + 'static,
    A: ResponseApi + 'static,
{
    /// Create a controller and the event stream the UI consumes
    pub fn new(
        plan: InterviewPlan,
        capture: C,
        recognizer: R,
        speaker: P,
        store: Arc<S>,
        sync: SyncEngine<S, A>,
        online: watch::Receiver<bool>,
    ) -> (Self, mpsc::UnboundedReceiver<InterviewEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let total = plan.questions.len();
        let controller = Self {
            inner: Arc::new(ControllerInner {
                capture,
                recognizer,
                speaker,
                store,
                sync,
                online,
                questions: plan.questions,
                time_limit_override: plan.time_limit_override,
                state: Mutex::new(ControllerState {
                    session: plan.session,
                    progress: InterviewProgress::new(total),
                    countdown: Countdown::new(0),
                    live: Transcript::new(),
                }),
                epoch: AtomicU64::new(0),
                events,
            }),
        };
        (controller, events_rx)
    }

    /// Get the current phase
    pub async fn phase(&self) -> InterviewPhase {
        self.inner.state.lock().await.progress.phase()
    }

    /// Get the question currently presented, if any
    pub async fn current_question(&self) -> Option<Question> {
        let state = self.inner.state.lock().await;
        if state.progress.phase() == InterviewPhase::Intro
            || state.progress.phase() == InterviewPhase::Complete
        {
            return None;
        }
        self.inner.questions.get(state.progress.current_index()).cloned()
    }

    /// Get a copy of the session record
    pub async fn session(&self) -> Session {
        self.inner.state.lock().await.session.clone()
    }

    /// Leave the intro and present the first question
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.progress.start() {
            return;
        }
        state.session.begin();
        self.present_current(&state);
    }

    /// Start capturing an answer. Requires finished playback; a
    /// capture failure is reported and leaves the question retryable.
    pub async fn begin_recording(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.progress.can_begin_recording() {
            return;
        }

        // Acquire the microphone before committing the phase, so a
        // denied device leaves the machine in QUESTION for a retry
        if let Err(e) = self.inner.capture.start().await {
            self.emit(InterviewEvent::CaptureFailed {
                message: e.to_string(),
            });
            return;
        }
        state.progress.begin_recording();

        let limit = self.effective_limit(state.progress.current_index());
        state.countdown = Countdown::new(limit);
        state.live = Transcript::new();
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        self.emit(InterviewEvent::PhaseChanged {
            phase: InterviewPhase::Recording,
        });

        // Recognition is best effort; capture continues without it
        match self.inner.recognizer.start().await {
            Ok(stream) => self.spawn_transcript_consumer(epoch, stream),
            Err(e) => self.emit(InterviewEvent::TranscriptionFailed {
                message: e.to_string(),
            }),
        }

        self.spawn_countdown(epoch);
    }

    /// Stop capturing, queue the answer durably, and enter review.
    /// Works identically for a manual stop and a countdown expiry.
    pub async fn stop_recording(&self, reason: StopReason) {
        let mut state = self.inner.state.lock().await;
        if !state.progress.stop_recording() {
            return;
        }
        let duration_secs = state.countdown.elapsed_secs();
        self.emit(InterviewEvent::PhaseChanged {
            phase: InterviewPhase::Review,
        });

        let (clip, transcript) =
            tokio::join!(self.inner.capture.stop(), self.inner.recognizer.stop());

        let audio = match clip {
            Ok(audio) => audio,
            Err(e) => {
                self.emit(InterviewEvent::CaptureFailed {
                    message: e.to_string(),
                });
                AudioClip::empty(AudioFormat::Flac)
            }
        };
        let transcript = match transcript {
            Ok(text) => text,
            Err(e) => {
                self.emit(InterviewEvent::TranscriptionFailed {
                    message: e.to_string(),
                });
                // Fall back to what was accumulated live
                state.live.final_text()
            }
        };

        self.emit(InterviewEvent::RecordingStopped {
            reason,
            duration_secs,
            audio_size: audio.human_readable_size(),
        });

        let question = &self.inner.questions[state.progress.current_index()];
        let response = PendingResponse::new(
            question.id,
            state.session.id,
            audio,
            transcript,
            duration_secs,
        );
        self.persist(response).await;
    }

    /// Skip the current question without persisting anything
    pub async fn skip(&self) {
        let mut state = self.inner.state.lock().await;
        let phase = state.progress.phase();
        let outcome = state.progress.skip();
        if outcome == Advance::Ignored {
            return;
        }

        if phase == InterviewPhase::Question {
            self.inner.speaker.cancel();
        }
        if phase == InterviewPhase::Recording {
            // Whatever the adapters were buffering is discarded
            if let Err(e) = self.inner.capture.cancel().await {
                self.emit(InterviewEvent::CaptureFailed {
                    message: e.to_string(),
                });
            }
            let _ = self.inner.recognizer.cancel().await;
        }
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Advance::NextQuestion(_) => self.present_current(&state),
            Advance::Completed => self.finish(&mut state).await,
            Advance::Ignored => {}
        }
    }

    /// Accept the reviewed answer and move on
    pub async fn advance(&self) {
        let mut state = self.inner.state.lock().await;
        match state.progress.advance() {
            Advance::NextQuestion(_) => self.present_current(&state),
            Advance::Completed => self.finish(&mut state).await,
            Advance::Ignored => {}
        }
    }

    /// Discard the reviewed answer's place in the flow and re-record
    /// the same question. The queued previous take stays until the
    /// new one overwrites it.
    pub async fn redo(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.progress.redo() {
            return;
        }
        let index = state.progress.current_index();
        self.emit(InterviewEvent::PhaseChanged {
            phase: InterviewPhase::Question,
        });
        self.emit(InterviewEvent::QuestionPresented {
            index,
            total: self.inner.questions.len(),
            question: self.inner.questions[index].clone(),
        });
        // No replay on a redo; recording may begin immediately
        self.emit(InterviewEvent::PlaybackFinished { index });
    }

    /// Tear down adapters for an aborted session. Nothing new is
    /// persisted; already-queued answers stay queued.
    pub async fn abort(&self) {
        let mut state = self.inner.state.lock().await;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.speaker.cancel();
        if state.progress.phase() == InterviewPhase::Recording {
            let _ = self.inner.capture.cancel().await;
            let _ = self.inner.recognizer.cancel().await;
        }
        state.session.cancel();
    }

    fn effective_limit(&self, index: usize) -> u32 {
        self.inner
            .time_limit_override
            .unwrap_or(self.inner.questions[index].time_limit_secs)
    }

    /// Emit the presentation events for the current question and play
    /// its prompt in the background.
    fn present_current(&self, state: &ControllerState) {
        let index = state.progress.current_index();
        let question = self.inner.questions[index].clone();
        self.emit(InterviewEvent::PhaseChanged {
            phase: InterviewPhase::Question,
        });
        self.emit(InterviewEvent::QuestionPresented {
            index,
            total: self.inner.questions.len(),
            question: question.clone(),
        });

        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.inner.speaker.speak(&question.prompt).await;
            let mut state = controller.inner.state.lock().await;
            if state.progress.current_index() != index {
                // The session moved on mid-playback
                return;
            }
            match result {
                Err(SpeechError::Cancelled) => return,
                Err(e) => controller.emit(InterviewEvent::PlaybackFailed {
                    message: e.to_string(),
                }),
                Ok(()) => {}
            }
            // A failed playback must not wedge the question; the
            // prompt text is on screen either way
            if state.progress.mark_playback_finished() {
                controller.emit(InterviewEvent::PlaybackFinished { index });
            }
        });
    }

    fn spawn_countdown(&self, epoch: u64) {
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(StdDuration::from_secs(1));
            // The first tick resolves immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = {
                    let mut state = controller.inner.state.lock().await;
                    if controller.inner.epoch.load(Ordering::SeqCst) != epoch
                        || state.progress.phase() != InterviewPhase::Recording
                    {
                        return;
                    }
                    let expired = state.countdown.tick();
                    controller.emit(InterviewEvent::CountdownTick {
                        elapsed_secs: state.countdown.elapsed_secs(),
                        remaining_secs: state.countdown.remaining_secs(),
                        limit_secs: state.countdown.limit_secs(),
                    });
                    expired
                };
                if expired {
                    controller.stop_recording(StopReason::Timeout).await;
                    return;
                }
            }
        });
    }

    fn spawn_transcript_consumer(
        &self,
        epoch: u64,
        mut stream: mpsc::UnboundedReceiver<TranscriptEvent>,
    ) {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                let mut state = controller.inner.state.lock().await;
                if controller.inner.epoch.load(Ordering::SeqCst) != epoch
                    || state.progress.phase() != InterviewPhase::Recording
                {
                    return;
                }
                match event {
                    TranscriptEvent::Interim(text) => state.live.set_interim(text),
                    TranscriptEvent::Final(segment) => state.live.push_final(&segment),
                    TranscriptEvent::Error(message) => {
                        controller.emit(InterviewEvent::TranscriptionFailed { message });
                        continue;
                    }
                }
                controller.emit(InterviewEvent::TranscriptUpdated {
                    snapshot: state.live.snapshot(),
                });
            }
        });
    }

    async fn persist(&self, response: PendingResponse) {
        let question_id = response.question_id;
        match self.inner.store.enqueue(&response).await {
            Ok(()) => {
                let pending_count = self
                    .inner
                    .store
                    .list_pending()
                    .await
                    .map(|pending| pending.len())
                    .unwrap_or(0);
                self.emit(InterviewEvent::ResponseQueued {
                    question_id,
                    pending_count,
                });
                // Offline enqueues wait for a connectivity event; an
                // eager drain here would just burn retry attempts
                if *self.inner.online.borrow() {
                    self.inner.sync.request_drain();
                }
            }
            Err(e) => self.emit(InterviewEvent::PersistFailed {
                message: e.to_string(),
                quota: e.is_quota(),
            }),
        }
    }

    async fn finish(&self, state: &mut ControllerState) {
        state.session.complete();
        self.emit(InterviewEvent::PhaseChanged {
            phase: InterviewPhase::Complete,
        });

        let mutation = QueuedMutation::new(MutationKind::TriggerEvaluation {
            session_id: state.session.id,
        });
        if let Err(e) = self.inner.store.enqueue_mutation(&mutation).await {
            self.emit(InterviewEvent::PersistFailed {
                message: e.to_string(),
                quota: e.is_quota(),
            });
        }
        if *self.inner.online.borrow() {
            self.inner.sync.request_drain();
        }

        self.emit(InterviewEvent::SessionCompleted {
            answered: state.progress.answered_count(),
            skipped: state.progress.skipped_count(),
        });
    }

    fn emit(&self, event: InterviewEvent) {
        let _ = self.inner.events.send(event);
    }
}
