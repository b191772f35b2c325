//! Speech audio decoding and playback
//!
//! The speech endpoint returns raw PCM: base64-encoded signed 16-bit
//! little-endian samples, mono, at 24 kHz. This module decodes that payload
//! into normalized f32 samples and defines the playback seam so the actual
//! audio device stays behind a trait.

use crate::error::{Result, TalviError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Sample rate of speech audio returned by the generation API, in Hz
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// A decoded speech clip ready for playback
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Normalized samples in `[-1.0, 1.0)`
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    /// Duration of the clip in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a base64 PCM16 payload into an audio clip
///
/// The payload is interpreted as signed 16-bit little-endian mono samples
/// at 24 kHz. Each sample is normalized by dividing by 32768.
///
/// # Errors
///
/// Returns a speech error when the payload is not valid base64 or its
/// byte length is odd.
///
/// # Examples
///
/// ```
/// use base64::{engine::general_purpose::STANDARD, Engine};
/// use talvi::audio::decode_pcm;
///
/// // One sample: i16::MIN, little-endian.
/// let payload = STANDARD.encode([0x00u8, 0x80]);
/// let clip = decode_pcm(&payload).unwrap();
/// assert_eq!(clip.samples, vec![-1.0]);
/// ```
pub fn decode_pcm(payload: &str) -> Result<AudioClip> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| TalviError::Speech(format!("Invalid base64 audio payload: {}", e)))?;

    if bytes.len() % 2 != 0 {
        return Err(TalviError::Speech(format!(
            "PCM16 payload has odd length: {} bytes",
            bytes.len()
        ))
        .into());
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioClip {
        samples,
        sample_rate: SPEECH_SAMPLE_RATE,
    })
}

/// Playback seam for decoded speech clips
///
/// The REPL installs a real device-backed sink; tests install a recording
/// fake. Playback is fire-and-forget: errors are reported, never retried.
pub trait AudioSink: Send + Sync {
    /// Play a decoded clip to completion
    fn play(&self, clip: &AudioClip) -> Result<()>;
}

/// Sink that drops every clip, for environments without an audio device
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&self, clip: &AudioClip) -> Result<()> {
        tracing::debug!(
            "Discarding {:.2}s speech clip (no audio device)",
            clip.duration_secs()
        );
        Ok(())
    }
}
