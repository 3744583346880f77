//! Procedural noise synthesis.
//!
//! Produces short, loopable buffers of white or pink noise. The playback
//! layer loops a buffer indefinitely instead of generating samples on the
//! fly; a couple of seconds of noise is indistinguishable from a
//! continuous stream.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::SoundError;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default length of a generated buffer in seconds.
pub const DEFAULT_BUFFER_SECONDS: f32 = 2.0;

/// Longest buffer [`generate`] will produce, in seconds.
pub const MAX_BUFFER_SECONDS: f32 = 60.0;

/// Highest sample rate [`generate`] accepts, in Hz.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Empirical gain that brings pink noise to the loudness of white noise.
pub const PINK_GAIN: f32 = 0.11;

/// The random process a [`NoiseBuffer`] realizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// Flat power spectrum
    White,
    /// Power spectrum falling about 3 dB per octave
    Pink,
}

impl NoiseKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseKind::White => "white",
            NoiseKind::Pink => "pink",
        }
    }
}

/// An immutable buffer of mono samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseBuffer {
    kind: NoiseKind,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl NoiseBuffer {
    /// Returns the algorithm that produced this buffer.
    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples. Never true for a
    /// buffer returned by [`generate`].
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback length of one loop.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    /// Consumes the buffer, returning its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Generates a noise buffer using the thread-local random source.
///
/// # Errors
///
/// Returns `SoundError::InvalidParameter` if `duration_seconds` is not a
/// positive finite number up to [`MAX_BUFFER_SECONDS`], `sample_rate` is zero
/// or above [`MAX_SAMPLE_RATE`], or the request rounds down to zero samples.
pub fn generate(
    kind: NoiseKind,
    duration_seconds: f32,
    sample_rate: u32,
) -> Result<NoiseBuffer, SoundError> {
    generate_with_rng(kind, duration_seconds, sample_rate, &mut rand::thread_rng())
}

/// Generates a noise buffer from the given random source.
///
/// # Errors
///
/// Same as [`generate`].
pub fn generate_with_rng<R: Rng + ?Sized>(
    kind: NoiseKind,
    duration_seconds: f32,
    sample_rate: u32,
    rng: &mut R,
) -> Result<NoiseBuffer, SoundError> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(SoundError::InvalidParameter(format!(
            "duration must be positive, got {duration_seconds}"
        )));
    }
    if duration_seconds > MAX_BUFFER_SECONDS {
        return Err(SoundError::InvalidParameter(format!(
            "duration must be at most {MAX_BUFFER_SECONDS}s, got {duration_seconds}"
        )));
    }
    if sample_rate == 0 {
        return Err(SoundError::InvalidParameter(
            "sample rate must be positive".to_string(),
        ));
    }
    if sample_rate > MAX_SAMPLE_RATE {
        return Err(SoundError::InvalidParameter(format!(
            "sample rate must be at most {MAX_SAMPLE_RATE} Hz, got {sample_rate}"
        )));
    }

    let len = (f64::from(duration_seconds) * f64::from(sample_rate)).round() as usize;
    if len == 0 {
        return Err(SoundError::InvalidParameter(format!(
            "{duration_seconds}s at {sample_rate} Hz yields no samples"
        )));
    }

    let samples = match kind {
        NoiseKind::White => (0..len).map(|_| white_sample(rng)).collect(),
        NoiseKind::Pink => pink_samples(len, rng),
    };

    Ok(NoiseBuffer {
        kind,
        sample_rate,
        samples,
    })
}

fn white_sample<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0f32..=1.0)
}

fn pink_samples<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    let mut filter = PinkFilter::default();
    let mut samples: Vec<f32> = (0..len)
        .map(|_| filter.process(white_sample(rng)) * PINK_GAIN)
        .collect();

    let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    if peak > 1.0 {
        for sample in &mut samples {
            *sample /= peak;
        }
    }
    samples
}

/// Paul Kellet's refined pink noise filter: six one-pole sections plus a
/// delayed direct term, accurate to about ±0.05 dB above 9.2 Hz at 44.1 kHz.
#[derive(Debug, Default)]
struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    fn process(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.055_517_9;
        b[1] = 0.99332 * b[1] + white * 0.075_076;
        b[2] = 0.96900 * b[2] + white * 0.153_852;
        b[3] = 0.86650 * b[3] + white * 0.310_485_6;
        b[4] = 0.55000 * b[4] + white * 0.532_952_2;
        b[5] = -0.7616 * b[5] - white * 0.016_898;
        let out = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115_926;
        out
    }
}
