//! Ambient playback controller.
//!
//! Owns the live audio graph for one session. Every control that changes
//! what is playing goes through [`PlaybackController::reconcile`], which
//! stops and releases the current voice before anything new is built, so at
//! most one voice exists at any instant.

use std::path::Path;

use tracing::{debug, info, warn};

use super::error::SoundError;
use super::noise::{self, DEFAULT_BUFFER_SECONDS, DEFAULT_SAMPLE_RATE};
use super::source::{clamp_volume, CustomTrack, SoundConfig, SourceType, DEFAULT_MAX_TRACK_BYTES};
use super::{AudioBackend, Voice};

/// Controls ambient playback through an [`AudioBackend`].
pub struct PlaybackController<B: AudioBackend> {
    /// Platform audio path
    backend: B,
    /// Current selection
    config: SoundConfig,
    /// Sample rate for synthesized noise
    sample_rate: u32,
    /// Loop length for synthesized noise
    buffer_seconds: f32,
    /// Ceiling for tracks loaded from disk
    max_track_bytes: u64,
    /// The one live voice, if any
    voice: Option<B::Voice>,
    /// Whether the user wants sound
    play_requested: bool,
}

impl<B: AudioBackend> PlaybackController<B> {
    /// Creates a stopped controller with default settings.
    ///
    /// The backend is not touched until the first [`play`](Self::play).
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: SoundConfig::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_seconds: DEFAULT_BUFFER_SECONDS,
            max_track_bytes: DEFAULT_MAX_TRACK_BYTES,
            voice: None,
            play_requested: false,
        }
    }

    /// Sets the sample rate used for synthesized noise.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the loop length used for synthesized noise.
    #[must_use]
    pub fn with_buffer_seconds(mut self, buffer_seconds: f32) -> Self {
        self.buffer_seconds = buffer_seconds;
        self
    }

    /// Sets the size ceiling for [`load_custom_track`](Self::load_custom_track).
    #[must_use]
    pub fn with_max_track_bytes(mut self, max_track_bytes: u64) -> Self {
        self.max_track_bytes = max_track_bytes;
        self
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Selects what to play. A running voice is replaced.
    ///
    /// # Errors
    ///
    /// Returns the error of building the new voice if playback was running.
    /// The selection is kept either way.
    pub fn set_source_type(&mut self, source_type: SourceType) -> Result<(), SoundError> {
        if self.config.source_type == source_type {
            return Ok(());
        }

        debug!(
            "Sound source: {} -> {}",
            self.config.source_type, source_type
        );
        self.config.source_type = source_type;
        self.reconcile()
    }

    /// Sets the volume, clamped to [0, 1], without restarting playback.
    ///
    /// Returns the volume actually applied.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.config.volume = volume;
        if let Some(voice) = self.voice.as_mut() {
            voice.set_volume(volume);
        }
        volume
    }

    /// Installs a custom track. A running custom voice is replaced.
    ///
    /// # Errors
    ///
    /// Returns the error of building the new voice if custom playback was
    /// running.
    pub fn set_custom_track(&mut self, track: CustomTrack) -> Result<(), SoundError> {
        debug!("Custom track set: {} ({} bytes)", track.name(), track.size());
        self.config.custom_track = Some(track);

        if self.config.source_type == SourceType::Custom {
            self.reconcile()
        } else {
            Ok(())
        }
    }

    /// Removes the custom track. Custom playback stops.
    pub fn clear_custom_track(&mut self) {
        if self.config.custom_track.take().is_none() {
            return;
        }
        if self.config.source_type == SourceType::Custom {
            self.teardown();
        }
    }

    /// Loads a track from disk, selects it, and starts playing it.
    ///
    /// # Errors
    ///
    /// Returns a file error if the track cannot be read (the current
    /// selection is left untouched), or the error of starting playback.
    pub fn load_custom_track(&mut self, path: impl AsRef<Path>) -> Result<(), SoundError> {
        let track = CustomTrack::from_path(path, self.max_track_bytes)?;
        info!("Loaded custom track: {}", track.name());

        self.config.custom_track = Some(track);
        self.config.source_type = SourceType::Custom;
        self.play_requested = true;
        self.reconcile()
    }

    /// Starts playback of the current selection.
    ///
    /// # Errors
    ///
    /// - `SoundError::NoSourceConfigured` if `Custom` is selected without a
    ///   track. The request is remembered and a later track starts playing.
    /// - `SoundError::PlaybackBlocked` if the backend cannot be resumed. The
    ///   request is dropped; call `play` again after user interaction.
    pub fn play(&mut self) -> Result<(), SoundError> {
        if self.is_playing() {
            return Ok(());
        }
        self.play_requested = true;
        self.reconcile()
    }

    /// Stops playback and releases the voice.
    pub fn pause(&mut self) {
        self.play_requested = false;
        self.teardown();
    }

    /// Plays if stopped, pauses if playing.
    ///
    /// Returns true if playback is running afterwards.
    ///
    /// # Errors
    ///
    /// Same as [`play`](Self::play).
    pub fn toggle(&mut self) -> Result<bool, SoundError> {
        if self.play_requested {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.is_playing())
    }

    /// Stops playback and releases the audio output.
    pub fn shutdown(&mut self) {
        self.pause();
        if self.backend.is_resumed() {
            self.backend.release();
            debug!("Audio output released");
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns true while a voice is producing sound.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.voice.as_ref().is_some_and(|voice| voice.is_active())
    }

    /// Returns true if the user wants sound, even if none is playing yet.
    #[must_use]
    pub fn wants_playback(&self) -> bool {
        self.play_requested
    }

    #[must_use]
    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    #[must_use]
    pub fn source_type(&self) -> SourceType {
        self.config.source_type
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.config.volume
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Brings the audio graph in line with the current selection.
    ///
    /// Always tears down first; builds only if playback is requested.
    fn reconcile(&mut self) -> Result<(), SoundError> {
        self.teardown();
        if !self.play_requested {
            return Ok(());
        }

        match self.build_voice() {
            Ok(voice) => {
                self.voice = Some(voice);
                info!("Playing {} sound", self.config.source_type.label());
                Ok(())
            }
            Err(e) => {
                if !matches!(e, SoundError::NoSourceConfigured) {
                    self.play_requested = false;
                }
                warn!("Playback not started: {}", e);
                Err(e)
            }
        }
    }

    fn build_voice(&mut self) -> Result<B::Voice, SoundError> {
        let volume = self.config.volume;

        match self.config.source_type.noise_kind() {
            Some(kind) => {
                self.backend.resume()?;
                let buffer = noise::generate(kind, self.buffer_seconds, self.sample_rate)?;
                self.backend.start_noise(buffer, volume)
            }
            None => {
                let track = self
                    .config
                    .custom_track
                    .as_ref()
                    .ok_or(SoundError::NoSourceConfigured)?;
                self.backend.resume()?;
                self.backend.start_track(track, volume)
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(mut voice) = self.voice.take() {
            voice.stop();
            debug!("Voice stopped");
        }
    }
}

impl<B: AudioBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<B: AudioBackend> std::fmt::Debug for PlaybackController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("config", &self.config)
            .field("playing", &self.is_playing())
            .field("play_requested", &self.play_requested)
            .finish_non_exhaustive()
    }
}
