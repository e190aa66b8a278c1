//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod interview;
pub mod recording;
pub mod response;
pub mod session;
pub mod transcript;

// Re-export common types
pub use error::*;
pub use config::AppConfig;
pub use interview::{Countdown, Duration, InterviewPhase, InterviewProgress, StopReason};
pub use recording::{AudioClip, AudioFormat};
pub use response::{MutationKind, PendingResponse, QueuedMutation, ResponseKey, ResponseStatus};
pub use session::{Question, QuestionCategory, Seniority, Session};
pub use transcript::Transcript;
