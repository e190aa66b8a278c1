//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod api;
pub mod capture;
pub mod config;
pub mod notifier;
pub mod oracle;
pub mod probe;
pub mod recognizer;
pub mod speech;
pub mod store;

// Re-export common types
pub use api::{ApiError, ResponseApi};
pub use capture::{AudioCapture, AudioFrame, CaptureError};
pub use config::ConfigStore;
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use oracle::{CriterionScore, Evaluation, InterviewOracle, OracleError};
pub use probe::ConnectivityProbe;
pub use recognizer::{RecognizerError, SpeechRecognizer, TranscriptEvent};
pub use speech::{SpeechError, SpeechSynthesizer};
pub use store::{ResponseStore, StoreError};
