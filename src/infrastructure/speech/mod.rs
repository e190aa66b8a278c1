//! Question playback adapters

mod chime;

pub use chime::ChimeSpeaker;
