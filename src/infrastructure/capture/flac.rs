//! FLAC encoding for queued answer audio
//!
//! Lossless but roughly 40% of raw PCM size, which matters because
//! every answer sits in the local queue until the server confirms it.
//!
//! Settings:
//! - 16kHz sample rate (speech-optimized)
//! - Mono channel
//! - 16-bit samples

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

/// Sample rate every clip is normalized to before encoding
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Number of channels (mono)
const CHANNELS: usize = 1;

/// Encode mono i16 samples at 16kHz into a FLAC byte stream
pub fn encode_flac(pcm_samples: &[i16]) -> Result<Vec<u8>, FlacError> {
    encode_flac_at(pcm_samples, TARGET_SAMPLE_RATE)
}

/// Encode mono i16 samples at an arbitrary rate.
///
/// Stored clips are normalized to 16kHz first and go through
/// [`encode_flac`]; live recognition windows ship at the device
/// rate and declare it in the request instead.
pub fn encode_flac_at(pcm_samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, FlacError> {
    // flacenc works on i32 samples internally
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| FlacError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        CHANNELS,
        BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| FlacError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| FlacError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum FlacError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_silence() {
        // 1 second of silence at 16kHz
        let silence = vec![0i16; TARGET_SAMPLE_RATE as usize];
        let flac_data = encode_flac(&silence).unwrap();

        assert!(flac_data.len() > 50);
        // FLAC magic number: "fLaC"
        assert_eq!(&flac_data[0..4], b"fLaC");
    }

    #[test]
    fn encode_short_answer() {
        // 100ms of silence (1600 samples at 16kHz)
        let silence = vec![0i16; 1600];
        assert!(encode_flac(&silence).is_ok());
    }

    #[test]
    fn encode_at_device_rate() {
        // 100ms at 48kHz, the common unresampled device rate
        let silence = vec![0i16; 4800];
        let flac_data = encode_flac_at(&silence, 48000).unwrap();
        assert_eq!(&flac_data[0..4], b"fLaC");
    }

    #[test]
    fn encode_compresses_a_tone() {
        // 440Hz sine, the kind of periodic signal FLAC squeezes well
        let samples: Vec<i16> = (0..TARGET_SAMPLE_RATE as usize)
            .map(|i| {
                let t = i as f32 / TARGET_SAMPLE_RATE as f32;
                (f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 16000.0) as i16
            })
            .collect();

        let flac_data = encode_flac(&samples).unwrap();
        assert!(flac_data.len() < samples.len() * 2);
    }
}
