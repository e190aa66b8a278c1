//! Recorded audio value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported audio container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Flac,
    Wav,
    Ogg,
}

impl AudioFormat {
    /// Get the MIME type string
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// Value object holding one recorded answer's audio.
/// A zero-length clip is legitimate: the user said nothing in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
    format: AudioFormat,
}

impl AudioClip {
    /// Create a clip from raw bytes
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// Create a clip from a byte slice
    pub fn from_bytes(data: &[u8], format: AudioFormat) -> Self {
        Self {
            data: data.to_vec(),
            format,
        }
    }

    /// Create an empty clip (no audio captured)
    pub fn empty(format: AudioFormat) -> Self {
        Self {
            data: Vec::new(),
            format,
        }
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw audio data
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether no audio was captured
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the audio data as base64
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Base64 (de)serialization for the binary payload, so clips embed
/// cleanly in the JSON queue records.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        base64::engine::general_purpose::STANDARD
            .encode(bytes)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
