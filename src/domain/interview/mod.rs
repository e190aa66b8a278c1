//! Interview domain module

mod countdown;
mod duration;
mod phase;

pub use countdown::Countdown;
pub use duration::Duration;
pub use phase::{Advance, InterviewPhase, InterviewProgress, StopReason};
