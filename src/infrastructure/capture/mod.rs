//! Capture infrastructure module
//!
//! Cross-platform microphone capture via cpal, encoded to FLAC for
//! compact durable queueing.

mod cpal_capture;
mod flac;

pub use cpal_capture::CpalCapture;
pub use flac::{encode_flac, encode_flac_at, FlacError, TARGET_SAMPLE_RATE};
