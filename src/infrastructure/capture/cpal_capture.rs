//! Cross-platform microphone capture using cpal
//!
//! Captures mono i16 at the device rate, resamples to 16kHz and
//! encodes to FLAC on stop. Raw frames are also published on a
//! broadcast channel so the recognition adapter can stream the same
//! microphone without opening a second device handle.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex as StdMutex};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::broadcast;
use tokio::time::Duration as TokioDuration;

use super::flac::{encode_flac, TARGET_SAMPLE_RATE};
use crate::application::ports::{AudioCapture, AudioFrame, CaptureError};
use crate::domain::recording::{AudioClip, AudioFormat};

/// Broadcast capacity in frames; a lagging recognition stream loses
/// old frames rather than stalling capture
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Microphone capture adapter built on cpal
///
/// The cpal stream lives on a dedicated thread because it is not
/// Send; the struct communicates with it through atomics and the
/// shared sample buffer.
pub struct CpalCapture {
    /// Captured samples (mono, i16, at device sample rate)
    audio_buffer: Arc<StdMutex<Vec<i16>>>,
    /// Device sample rate (may differ from the 16kHz target)
    device_sample_rate: Arc<AtomicU32>,
    /// Capture state
    is_capturing: Arc<AtomicBool>,
    /// Live frame tap shared with the recognition adapter
    frames_tx: broadcast::Sender<AudioFrame>,
}

impl CpalCapture {
    /// Create a capture adapter; the microphone is not touched until
    /// `start()`
    pub fn new() -> Self {
        let (frames_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            audio_buffer: Arc::new(StdMutex::new(Vec::new())),
            device_sample_rate: Arc::new(AtomicU32::new(0)),
            is_capturing: Arc::new(AtomicBool::new(false)),
            frames_tx,
        }
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::DeviceUnavailable)
    }

    /// Get a suitable input configuration, preferring mono at 16kHz
    fn get_input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StartFailed(format!("Failed to get configs: {}", e)))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            // Only i16 and f32 formats are handled
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && config.max_sample_rate().0 >= TARGET_SAMPLE_RATE;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > TARGET_SAMPLE_RATE;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| CaptureError::StartFailed("No suitable config found".into()))?;

        // Capture natively at 16kHz when the device supports it
        let sample_rate = if config_range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
            && config_range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    fn classify_stream_error(e: &cpal::BuildStreamError) -> CaptureError {
        match e {
            cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
            other => {
                let message = other.to_string();
                if message.to_lowercase().contains("permission") {
                    CaptureError::PermissionDenied
                } else {
                    CaptureError::StartFailed(message)
                }
            }
        }
    }

    /// Resample from the device rate to 16kHz if needed
    fn resample_to_16k(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, CaptureError> {
        if source_rate == TARGET_SAMPLE_RATE {
            return Ok(samples.to_vec());
        }

        let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

        let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
        let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

        let mut resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            TARGET_SAMPLE_RATE as usize,
            1024, // Chunk size
            2,    // Sub-chunks
            1,    // Mono
        )
        .map_err(|e| CaptureError::EncodingFailed(format!("Resampler init failed: {}", e)))?;

        let mut output = Vec::with_capacity(output_len);
        let mut input_pos = 0;

        while input_pos < samples_f32.len() {
            let frames_needed = resampler.input_frames_next();
            let end_pos = (input_pos + frames_needed).min(samples_f32.len());
            let chunk: Vec<Vec<f32>> = vec![samples_f32[input_pos..end_pos].to_vec()];

            // Pad the tail chunk up to the resampler's frame size
            let chunk = if chunk[0].len() < frames_needed {
                let mut padded = chunk[0].clone();
                padded.resize(frames_needed, 0.0);
                vec![padded]
            } else {
                chunk
            };

            let resampled = resampler
                .process(&chunk, None)
                .map_err(|e| CaptureError::EncodingFailed(format!("Resampling failed: {}", e)))?;

            output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
            input_pos = end_pos;
        }

        output.truncate(output_len);

        Ok(output)
    }

    /// Mix interleaved multi-channel samples down to mono
    fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    /// Normalize to 16kHz and encode to FLAC
    fn encode_clip(samples: &[i16], sample_rate: u32) -> Result<AudioClip, CaptureError> {
        let resampled = Self::resample_to_16k(samples, sample_rate)?;

        let flac_data = encode_flac(&resampled)
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

        if flac_data.is_empty() {
            return Err(CaptureError::EncodingFailed("Encoded audio is empty".into()));
        }

        Ok(AudioClip::new(flac_data, AudioFormat::Flac))
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&self) -> Result<(), CaptureError> {
        if self.is_capturing.load(Ordering::SeqCst) {
            return Err(CaptureError::StartFailed(
                "Capture already in progress".to_string(),
            ));
        }

        {
            let mut buffer = self.audio_buffer.lock().unwrap();
            buffer.clear();
        }

        self.is_capturing.store(true, Ordering::SeqCst);

        let audio_buffer = Arc::clone(&self.audio_buffer);
        let device_sample_rate = Arc::clone(&self.device_sample_rate);
        let is_capturing = Arc::clone(&self.is_capturing);
        let frames_tx = self.frames_tx.clone();

        // The thread reports its startup outcome once, then owns the
        // stream until the capture flag drops
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), CaptureError>>();

        std::thread::spawn(move || {
            let device = match CpalCapture::get_input_device() {
                Ok(d) => d,
                Err(e) => {
                    is_capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let (config, sample_format) = match CpalCapture::get_input_config(&device) {
                Ok(c) => c,
                Err(e) => {
                    is_capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            let sample_rate = config.sample_rate.0;
            let channels = config.channels;
            device_sample_rate.store(sample_rate, Ordering::SeqCst);

            let stream_result = match sample_format {
                SampleFormat::I16 => {
                    let buffer = Arc::clone(&audio_buffer);
                    let capturing = Arc::clone(&is_capturing);
                    let frames = frames_tx.clone();
                    device.build_input_stream(
                        &config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            if capturing.load(Ordering::SeqCst) {
                                let mono = CpalCapture::mix_to_mono(data, channels);
                                // No receivers is fine; the tap is optional
                                let _ = frames.send(AudioFrame {
                                    sample_rate,
                                    samples: mono.clone(),
                                });
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| eprintln!("Audio stream error: {}", err),
                        None,
                    )
                }

                SampleFormat::F32 => {
                    let buffer = Arc::clone(&audio_buffer);
                    let capturing = Arc::clone(&is_capturing);
                    let frames = frames_tx.clone();
                    device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if capturing.load(Ordering::SeqCst) {
                                let i16_data: Vec<i16> =
                                    data.iter().map(|&s| (s * 32767.0) as i16).collect();
                                let mono = CpalCapture::mix_to_mono(&i16_data, channels);
                                let _ = frames.send(AudioFrame {
                                    sample_rate,
                                    samples: mono.clone(),
                                });
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| eprintln!("Audio stream error: {}", err),
                        None,
                    )
                }

                _ => {
                    is_capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(CaptureError::StartFailed(
                        "Unsupported sample format".into(),
                    )));
                    return;
                }
            };

            let stream = match stream_result {
                Ok(s) => s,
                Err(e) => {
                    is_capturing.store(false, Ordering::SeqCst);
                    let _ = ready_tx.send(Err(CpalCapture::classify_stream_error(&e)));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                is_capturing.store(false, Ordering::SeqCst);
                let _ = ready_tx.send(Err(CaptureError::StartFailed(e.to_string())));
                return;
            }

            let _ = ready_tx.send(Ok(()));

            // Keep the stream alive until stop or cancel drops the flag
            while is_capturing.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }

            drop(stream);
        });

        let ready = tokio::task::spawn_blocking(move || {
            ready_rx.recv_timeout(std::time::Duration::from_secs(5))
        })
        .await
        .map_err(|e| CaptureError::StartFailed(format!("Capture task join error: {}", e)))?;

        match ready {
            Ok(outcome) => outcome,
            Err(_) => {
                self.is_capturing.store(false, Ordering::SeqCst);
                Err(CaptureError::StartFailed(
                    "Capture thread did not start".into(),
                ))
            }
        }
    }

    async fn stop(&self) -> Result<AudioClip, CaptureError> {
        if !self.is_capturing.load(Ordering::SeqCst) {
            return Err(CaptureError::ReadFailed("No capture in progress".to_string()));
        }

        self.is_capturing.store(false, Ordering::SeqCst);

        // Let the capture thread drop the stream and flush callbacks
        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        let samples = {
            let mut buffer = self.audio_buffer.lock().unwrap();
            std::mem::take(&mut *buffer)
        };

        // Saying nothing in time is a legitimate answer
        if samples.is_empty() {
            return Ok(AudioClip::empty(AudioFormat::Flac));
        }

        let sample_rate = self.device_sample_rate.load(Ordering::SeqCst);
        if sample_rate == 0 {
            return Err(CaptureError::ReadFailed("Sample rate not set".into()));
        }

        let encoded =
            tokio::task::spawn_blocking(move || Self::encode_clip(&samples, sample_rate))
                .await
                .map_err(|e| CaptureError::EncodingFailed(format!("Encode task error: {}", e)))??;

        Ok(encoded)
    }

    async fn cancel(&self) -> Result<(), CaptureError> {
        self.is_capturing.store(false, Ordering::SeqCst);

        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        {
            let mut buffer = self.audio_buffer.lock().unwrap();
            buffer.clear();
        }

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_capturing.load(Ordering::SeqCst)
    }

    fn frames(&self) -> broadcast::Receiver<AudioFrame> {
        self.frames_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_to_mono_single_channel() {
        let mono = vec![100i16, 200, 300];
        let result = CpalCapture::mix_to_mono(&mono, 1);
        assert_eq!(result, mono);
    }

    #[test]
    fn mix_to_mono_two_channels() {
        let stereo = vec![100i16, 200, 300, 400];
        let result = CpalCapture::mix_to_mono(&stereo, 2);
        assert_eq!(result, vec![150, 350]); // Average of each pair
    }

    #[test]
    fn resample_at_target_rate_is_identity() {
        let samples = vec![1i16, 2, 3, 4, 5];
        let result = CpalCapture::resample_to_16k(&samples, TARGET_SAMPLE_RATE).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn capture_default_state() {
        let capture = CpalCapture::new();
        assert!(!capture.is_active());
    }

    #[test]
    fn frame_tap_accepts_subscribers() {
        let capture = CpalCapture::new();
        let rx = capture.frames();
        assert_eq!(rx.len(), 0);
    }
}
