//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod controller;
pub mod network;
pub mod ports;
pub mod sync;

// Re-export use cases
pub use controller::{InterviewController, InterviewEvent, InterviewPlan};
pub use network::NetworkMonitor;
pub use sync::{DrainMode, SyncEngine, SyncReport, MAX_SYNC_ATTEMPTS};
