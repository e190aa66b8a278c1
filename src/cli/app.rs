//! Main app runner for an interview session

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::ports::{
    AudioCapture, ConfigStore, InterviewOracle, NotificationIcon, Notifier, ResponseApi,
    ResponseStore, SpeechRecognizer, SpeechSynthesizer,
};
use crate::application::{
    DrainMode, InterviewController, InterviewEvent, InterviewPlan, NetworkMonitor, SyncEngine,
};
use crate::domain::config::AppConfig;
use crate::domain::interview::{InterviewPhase, StopReason};
use crate::domain::session::{Question, Seniority, Session};
use crate::infrastructure::{
    create_notifier, CannedOracle, ChimeSpeaker, CpalCapture, HttpProbe, HttpRecognizer,
    HttpResponseApi, JsonDirStore, NullRecognizer, XdgConfigStore,
};

use super::presenter::Presenter;
use super::queue_cmd::describe_report;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Connectivity probe cadence
const PROBE_INTERVAL: StdDuration = StdDuration::from_secs(15);
/// How long a connectivity flip must hold before it is trusted
const PROBE_DEBOUNCE: StdDuration = StdDuration::from_secs(2);
/// Cadence of background drain attempts while online
const PERIODIC_DRAIN_INTERVAL: StdDuration = StdDuration::from_secs(30);
/// Remaining seconds at which the almost-out-of-time warning fires
const WARNING_REMAINING_SECS: u32 = 10;

/// Resolved options for one rehearsal run
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub role: String,
    pub seniority: Seniority,
    pub questions: u32,
    pub time_limit_override: Option<u32>,
    pub server_url: String,
    pub speech_url: Option<String>,
    pub api_key: Option<String>,
    pub notify: bool,
    pub chime: bool,
}

impl SessionOptions {
    /// Derive run options from a merged config plus the chime switch
    pub fn from_config(config: &AppConfig, chime: bool) -> Self {
        Self {
            role: config.role_or_default().to_string(),
            seniority: config.seniority_or_default(),
            questions: config.questions_or_default(),
            time_limit_override: config.time_limit_override().map(|d| d.as_secs() as u32),
            server_url: config.server_url_or_default().to_string(),
            speech_url: config.speech_url.clone(),
            api_key: config.api_key.clone(),
            notify: config.notify_or_default(),
            chime,
        }
    }
}

/// Load and merge configuration from file and CLI.
/// Environment variables arrive through clap, so they are already part
/// of the CLI layer here.
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Run one interactive rehearsal session
pub async fn run_session(options: SessionOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let store = Arc::new(JsonDirStore::new());
    let api = HttpResponseApi::new(&options.server_url, options.api_key.clone());
    let engine = SyncEngine::new(Arc::clone(&store), api);
    let monitor = NetworkMonitor::spawn(
        HttpProbe::new(&options.server_url),
        PROBE_INTERVAL,
        PROBE_DEBOUNCE,
    );

    let oracle = CannedOracle::new();
    let session = Session::new(options.role.clone(), options.seniority);
    let questions = match oracle
        .generate_questions(
            session.id,
            &options.role,
            "",
            options.seniority,
            options.questions,
        )
        .await
    {
        Ok(questions) => questions,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    presenter.output(&format!(
        "Rehearsal for {} ({}), {} questions",
        options.role,
        options.seniority,
        questions.len()
    ));
    if options.speech_url.is_none() {
        presenter.info("No speech endpoint configured; recording without a live transcript");
    }
    presenter.hint("Enter to begin · q to quit");

    let capture = CpalCapture::new();
    let speaker = ChimeSpeaker::new(options.chime);
    let notifier = create_notifier(options.notify);

    let plan = InterviewPlan {
        session,
        questions,
        time_limit_override: options.time_limit_override,
    };

    // The recognizer type is fixed at startup; both arms run the same
    // session loop.
    match &options.speech_url {
        Some(url) => {
            let recognizer =
                HttpRecognizer::new(url.clone(), options.api_key.clone(), capture.frames());
            let (controller, events) = InterviewController::new(
                plan,
                capture,
                recognizer,
                speaker,
                Arc::clone(&store),
                engine.clone(),
                monitor.subscribe(),
            );
            drive_session(
                controller,
                events,
                store,
                engine,
                &monitor,
                oracle,
                notifier,
                &mut presenter,
            )
            .await
        }
        None => {
            let recognizer = NullRecognizer::new();
            let (controller, events) = InterviewController::new(
                plan,
                capture,
                recognizer,
                speaker,
                Arc::clone(&store),
                engine.clone(),
                monitor.subscribe(),
            );
            drive_session(
                controller,
                events,
                store,
                engine,
                &monitor,
                oracle,
                notifier,
                &mut presenter,
            )
            .await
        }
    }
}

/// What a line of input asks the loop to do
enum InputAction {
    Continue,
    Quit,
}

#[allow(clippy::too_many_arguments)]
async fn drive_session<R>(
    controller: InterviewController<CpalCapture, R, ChimeSpeaker, JsonDirStore, HttpResponseApi>,
    mut events: mpsc::UnboundedReceiver<InterviewEvent>,
    store: Arc<JsonDirStore>,
    engine: SyncEngine<JsonDirStore, HttpResponseApi>,
    monitor: &NetworkMonitor,
    oracle: CannedOracle,
    notifier: Box<dyn Notifier>,
    presenter: &mut Presenter,
) -> ExitCode
where
    R: SpeechRecognizer + 'static,
{
    let mut online = monitor.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut drain_ticker = tokio::time::interval(PERIODIC_DRAIN_INTERVAL);
    // The first tick resolves immediately
    drain_ticker.tick().await;

    let mut current_question: Option<Question> = None;
    let mut live_transcript = String::new();
    let mut last_transcription_error: Option<String> = None;
    let mut warned_low_time = false;
    let mut completed = false;
    let mut aborted = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    InterviewEvent::PhaseChanged { phase } => {
                        if phase == InterviewPhase::Recording {
                            live_transcript.clear();
                            warned_low_time = false;
                            presenter.show_recording_progress(
                                "Recording... Enter to stop, s to skip",
                            );
                        }
                    }
                    InterviewEvent::QuestionPresented { index, total, question } => {
                        presenter.question_header(index, total, &question);
                        current_question = Some(question);
                    }
                    InterviewEvent::PlaybackFinished { .. } => {
                        presenter.hint("Enter to record · s to skip · q to quit");
                    }
                    InterviewEvent::PlaybackFailed { message } => {
                        presenter.warn(&message);
                    }
                    InterviewEvent::CountdownTick { elapsed_secs, remaining_secs, limit_secs } => {
                        presenter.update_recording_progress(
                            elapsed_secs,
                            limit_secs,
                            &tail_of(&live_transcript),
                        );
                        if remaining_secs == WARNING_REMAINING_SECS && !warned_low_time {
                            warned_low_time = true;
                            let _ = notifier
                                .notify(
                                    "Time check",
                                    &format!("{} seconds left", remaining_secs),
                                    NotificationIcon::Warning,
                                )
                                .await;
                        }
                    }
                    InterviewEvent::TranscriptUpdated { snapshot } => {
                        live_transcript = snapshot;
                    }
                    InterviewEvent::RecordingStopped { reason, duration_secs, audio_size } => {
                        presenter.stop_spinner();
                        if reason == StopReason::Timeout {
                            presenter.warn("Time is up");
                            let _ = notifier
                                .notify(
                                    "Time check",
                                    "Time is up, your answer was saved",
                                    NotificationIcon::Recording,
                                )
                                .await;
                        }
                        presenter.success(&format!(
                            "Answer recorded ({}s, {})",
                            duration_secs, audio_size
                        ));
                    }
                    InterviewEvent::ResponseQueued { question_id: _, pending_count } => {
                        presenter.info(&format!(
                            "Answer queued ({} waiting to sync)",
                            pending_count
                        ));
                        show_quick_read(
                            &oracle,
                            current_question.as_ref(),
                            &live_transcript,
                            presenter,
                        )
                        .await;
                        presenter.hint("Enter to continue · r to re-record · q to quit");
                    }
                    InterviewEvent::PersistFailed { message, quota } => {
                        presenter.stop_spinner();
                        if quota {
                            presenter.error(&format!(
                                "Local storage is full, this answer is not protected: {}",
                                message
                            ));
                        } else {
                            presenter.error(&format!("Could not queue the answer: {}", message));
                        }
                        presenter.hint("Enter to continue · r to re-record · q to quit");
                    }
                    InterviewEvent::CaptureFailed { message } => {
                        presenter.stop_spinner();
                        presenter.error(&format!("Microphone: {}", message));
                        presenter.hint("Enter to retry · s to skip · q to quit");
                    }
                    InterviewEvent::TranscriptionFailed { message } => {
                        // The same endpoint failure repeats every window
                        if last_transcription_error.as_deref() != Some(message.as_str()) {
                            presenter.warn(&format!("Live transcription unavailable: {}", message));
                            last_transcription_error = Some(message);
                        }
                    }
                    InterviewEvent::SessionCompleted { answered, skipped } => {
                        presenter.output("");
                        presenter.success(&format!(
                            "Session complete: {} answered, {} skipped",
                            answered, skipped
                        ));
                        let _ = notifier
                            .notify(
                                "Session complete",
                                &format!("{} answered, {} skipped", answered, skipped),
                                NotificationIcon::Success,
                            )
                            .await;
                        completed = true;
                        break;
                    }
                }
            }
            line = stdin.next_line() => {
                match line {
                    Ok(Some(input)) => {
                        if let InputAction::Quit = dispatch_input(input.trim(), &controller).await {
                            controller.abort().await;
                            aborted = true;
                            break;
                        }
                    }
                    Ok(None) | Err(_) => {
                        // stdin closed; treat it like a quit
                        controller.abort().await;
                        aborted = true;
                        break;
                    }
                }
            }
            changed = online.changed() => {
                if changed.is_ok() {
                    if *online.borrow_and_update() {
                        presenter.info("Back online, syncing queued answers");
                        engine.request_drain();
                    } else {
                        presenter.warn("Offline, answers will queue locally");
                    }
                }
            }
            _ = drain_ticker.tick() => {
                if monitor.is_online() {
                    engine.request_drain();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.abort().await;
                presenter.warn("Session aborted");
                aborted = true;
                break;
            }
        }
    }

    if completed {
        finish_sync(&engine, monitor, notifier.as_ref(), presenter).await;
    } else if aborted {
        let queued = store.list_pending().await.map(|p| p.len()).unwrap_or(0);
        if queued > 0 {
            presenter.info(&format!(
                "{} answer(s) stay queued; run 'rehearse queue sync' when ready",
                queued
            ));
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Map a line of input onto the operation valid for the current phase
async fn dispatch_input<C, R, P, S, A>(
    input: &str,
    controller: &InterviewController<C, R, P, S, A>,
) -> InputAction
where
    C: AudioCapture + 'static,
    R: SpeechRecognizer + 'static,
    P: SpeechSynthesizer + 'static,
    S: ResponseStore + 'static,
    A: ResponseApi + 'static,
{
    match input {
        "" => match controller.phase().await {
            InterviewPhase::Intro => controller.start().await,
            InterviewPhase::Question => controller.begin_recording().await,
            InterviewPhase::Recording => controller.stop_recording(StopReason::Manual).await,
            InterviewPhase::Review => controller.advance().await,
            InterviewPhase::Complete => {}
        },
        "s" => controller.skip().await,
        "r" => controller.redo().await,
        "q" => return InputAction::Quit,
        _ => {}
    }
    InputAction::Continue
}

/// Offer a local first impression of the answer while the server-side
/// evaluation is still queued.
async fn show_quick_read(
    oracle: &CannedOracle,
    question: Option<&Question>,
    transcript: &str,
    presenter: &Presenter,
) {
    let Some(question) = question else { return };
    if let Ok(evaluation) = oracle.evaluate(question, transcript).await {
        presenter.output(&format!(
            "Quick read: {:.1}/10. {}",
            evaluation.overall, evaluation.feedback
        ));
    }
}

/// Drain the queue once at the end of a completed session
async fn finish_sync(
    engine: &SyncEngine<JsonDirStore, HttpResponseApi>,
    monitor: &NetworkMonitor,
    notifier: &dyn Notifier,
    presenter: &mut Presenter,
) {
    if !monitor.is_online() {
        presenter.warn(
            "Offline: answers are queued locally. Run 'rehearse queue sync' once connected.",
        );
        return;
    }

    presenter.start_spinner("Syncing answers...");
    match engine.drain(DrainMode::Auto).await {
        None => {
            presenter.stop_spinner();
            presenter.info("A sync pass is already running in the background");
        }
        Some(report) if report.is_empty() => {
            presenter.spinner_success("Everything synced");
        }
        Some(report) => {
            let summary = describe_report(&report);
            if report.failed > 0 || report.mutations_failed > 0 {
                presenter.spinner_fail(&summary);
                presenter.info("Run 'rehearse queue sync' to retry");
                let _ = notifier
                    .notify(
                        "Sync",
                        "Some answers failed to sync",
                        NotificationIcon::Sync,
                    )
                    .await;
            } else {
                presenter.spinner_success(&summary);
            }
        }
    }
}

/// Last stretch of the live transcript, sized for a spinner line
fn tail_of(snapshot: &str) -> String {
    const TAIL_CHARS: usize = 48;
    let count = snapshot.chars().count();
    if count <= TAIL_CHARS {
        return snapshot.to_string();
    }
    let tail: String = snapshot.chars().skip(count - TAIL_CHARS).collect();
    format!("…{}", tail)
}
