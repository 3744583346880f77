//! Ambient sound system.
//!
//! This module provides masking audio for focus sessions, including:
//!
//! - Procedural white and pink noise synthesis
//! - Looping playback of a user-supplied track
//! - A controller that keeps exactly one source alive at a time
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  PlaybackController  │ ← Main interface
//! └──────────┬───────────┘
//!            │ one Voice at a time
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │     AudioBackend     │────▶│  NoiseBuffer     │
//! │  (rodio / mock)      │     │  (white / pink)  │
//! │                      │────▶│  CustomTrack     │
//! └──────────────────────┘     └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use focusnoise::sound::{PlaybackController, RodioBackend, SourceType};
//!
//! let mut controller = PlaybackController::new(RodioBackend::new());
//! controller.set_source_type(SourceType::Pink).expect("switch");
//! controller.play().expect("playback blocked");
//! controller.set_volume(0.3);
//! controller.pause();
//! ```

mod controller;
mod error;
pub mod noise;
mod player;
mod source;

use std::sync::{Arc, Mutex, MutexGuard};

pub use controller::PlaybackController;
pub use error::SoundError;
pub use noise::{generate, NoiseBuffer, NoiseKind};
pub use player::{RodioBackend, RodioVoice};
pub use source::{
    clamp_volume, CustomTrack, SoundConfig, SourceType, DEFAULT_MAX_TRACK_BYTES, DEFAULT_VOLUME,
};

/// A single sound-producing resource started by an [`AudioBackend`].
pub trait Voice {
    /// Changes the gain of the running voice without restarting it.
    fn set_volume(&mut self, volume: f32);

    /// Stops output and releases the voice's resources. Idempotent.
    fn stop(&mut self);

    /// Returns true while the voice is producing sound.
    fn is_active(&self) -> bool;
}

/// Trait for the platform audio path.
///
/// This trait abstracts the output device, allowing for different
/// implementations (e.g., rodio-based, mock for testing).
pub trait AudioBackend {
    /// The voice type this backend produces.
    type Voice: Voice;

    /// Acquires or resumes the audio output.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::PlaybackBlocked` if the platform refuses.
    fn resume(&mut self) -> Result<(), SoundError>;

    /// Returns true if the output is currently acquired.
    fn is_resumed(&self) -> bool;

    /// Starts looping a noise buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the output is not resumed or no sink can be made.
    fn start_noise(&mut self, buffer: NoiseBuffer, volume: f32) -> Result<Self::Voice, SoundError>;

    /// Starts looping a custom track.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DecodeError` if the track cannot be decoded, or
    /// an output error as for [`start_noise`](Self::start_noise).
    fn start_track(&mut self, track: &CustomTrack, volume: f32)
        -> Result<Self::Voice, SoundError>;

    /// Releases the audio output. The next `resume` acquires it again.
    fn release(&mut self);
}

// ============================================================================
// Mock backend
// ============================================================================

/// A voice recorded by [`MockAudioBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct StartedVoice {
    /// `white`, `pink`, or `custom:<track name>`
    pub source: String,
    /// Volume at start
    pub volume: f32,
}

#[derive(Debug, Default)]
struct MockState {
    resumed: bool,
    blocked: bool,
    fail_decode: bool,
    active_voices: usize,
    peak_active_voices: usize,
    started: Vec<StartedVoice>,
    stop_count: usize,
    release_count: usize,
    volume_changes: Vec<f32>,
}

/// Mock audio backend for testing.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockAudioBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `resume` fail as if the platform had not granted audio yet.
    pub fn set_blocked(&self, blocked: bool) {
        self.lock().blocked = blocked;
    }

    /// Makes `start_track` fail with a decode error.
    pub fn set_fail_decode(&self, fail: bool) {
        self.lock().fail_decode = fail;
    }

    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.lock().active_voices
    }

    /// Highest number of simultaneously active voices ever observed.
    #[must_use]
    pub fn peak_active_voices(&self) -> usize {
        self.lock().peak_active_voices
    }

    #[must_use]
    pub fn started(&self) -> Vec<StartedVoice> {
        self.lock().started.clone()
    }

    #[must_use]
    pub fn start_count(&self) -> usize {
        self.lock().started.len()
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.lock().stop_count
    }

    #[must_use]
    pub fn release_count(&self) -> usize {
        self.lock().release_count
    }

    /// Volumes applied to live voices, in call order.
    #[must_use]
    pub fn volume_changes(&self) -> Vec<f32> {
        self.lock().volume_changes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start_voice(&self, source: String, volume: f32) -> Result<MockVoice, SoundError> {
        let mut state = self.lock();
        if !state.resumed {
            return Err(SoundError::PlaybackBlocked(
                "audio output has not been resumed".to_string(),
            ));
        }

        state.active_voices += 1;
        state.peak_active_voices = state.peak_active_voices.max(state.active_voices);
        state.started.push(StartedVoice { source, volume });

        Ok(MockVoice {
            state: Arc::clone(&self.state),
            active: true,
        })
    }
}

impl AudioBackend for MockAudioBackend {
    type Voice = MockVoice;

    fn resume(&mut self) -> Result<(), SoundError> {
        let mut state = self.lock();
        if state.blocked {
            return Err(SoundError::PlaybackBlocked(
                "audio context is suspended".to_string(),
            ));
        }
        state.resumed = true;
        Ok(())
    }

    fn is_resumed(&self) -> bool {
        self.lock().resumed
    }

    fn start_noise(&mut self, buffer: NoiseBuffer, volume: f32) -> Result<MockVoice, SoundError> {
        self.start_voice(buffer.kind().as_str().to_string(), volume)
    }

    fn start_track(&mut self, track: &CustomTrack, volume: f32) -> Result<MockVoice, SoundError> {
        if self.lock().fail_decode {
            return Err(SoundError::DecodeError(format!(
                "{}: unsupported format",
                track.name()
            )));
        }
        self.start_voice(format!("custom:{}", track.name()), volume)
    }

    fn release(&mut self) {
        let mut state = self.lock();
        state.resumed = false;
        state.release_count += 1;
    }
}

/// Voice produced by [`MockAudioBackend`].
#[derive(Debug)]
pub struct MockVoice {
    state: Arc<Mutex<MockState>>,
    active: bool,
}

impl Voice for MockVoice {
    fn set_volume(&mut self, volume: f32) {
        if self.active {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.volume_changes.push(volume);
        }
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.active_voices -= 1;
            state.stop_count += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for MockVoice {
    fn drop(&mut self) {
        self.stop();
    }
}
