//! Audio backend implementation using rodio.
//!
//! This module provides the `RodioBackend` which uses the rodio v0.20
//! audio library for cross-platform playback. Each voice gets its own
//! `Sink`, which doubles as the voice's gain node.

use std::io::Cursor;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::noise::NoiseBuffer;
use super::source::CustomTrack;
use super::{AudioBackend, Voice};

/// An audio backend that plays through the default output device.
///
/// The output stream is opened lazily by [`AudioBackend::resume`] and kept
/// until [`AudioBackend::release`] or drop.
#[derive(Default)]
pub struct RodioBackend {
    /// The audio output stream and its handle (stream must stay alive).
    output: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioBackend {
    /// Creates a backend without touching the audio hardware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn new_sink(&self, volume: f32) -> Result<Sink, SoundError> {
        let (_, handle) = self.output.as_ref().ok_or_else(|| {
            SoundError::PlaybackBlocked("audio output has not been resumed".to_string())
        })?;

        let sink = Sink::try_new(handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
        sink.set_volume(volume);
        Ok(sink)
    }
}

impl AudioBackend for RodioBackend {
    type Voice = RodioVoice;

    fn resume(&mut self) -> Result<(), SoundError> {
        if self.output.is_some() {
            return Ok(());
        }

        let output =
            OutputStream::try_default().map_err(|e| SoundError::PlaybackBlocked(e.to_string()))?;
        self.output = Some(output);

        debug!("Audio output stream initialized");
        Ok(())
    }

    fn is_resumed(&self) -> bool {
        self.output.is_some()
    }

    fn start_noise(&mut self, buffer: NoiseBuffer, volume: f32) -> Result<RodioVoice, SoundError> {
        let sink = self.new_sink(volume)?;
        let kind = buffer.kind();
        let sample_rate = buffer.sample_rate();

        let source = SamplesBuffer::new(1, sample_rate, buffer.into_samples()).repeat_infinite();
        sink.append(source);

        debug!("Started {} noise loop", kind.as_str());
        Ok(RodioVoice::new(sink))
    }

    fn start_track(&mut self, track: &CustomTrack, volume: f32) -> Result<RodioVoice, SoundError> {
        let decoder = Decoder::new_looped(Cursor::new(track.bytes()))
            .map_err(|e| SoundError::DecodeError(format!("{}: {}", track.name(), e)))?;

        let sink = self.new_sink(volume)?;
        sink.append(decoder);

        debug!("Started custom track loop: {}", track.name());
        Ok(RodioVoice::new(sink))
    }

    fn release(&mut self) {
        if self.output.take().is_some() {
            debug!("Audio output stream released");
        }
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend")
            .field("resumed", &self.output.is_some())
            .finish_non_exhaustive()
    }
}

/// One looping source playing through its own sink.
pub struct RodioVoice {
    sink: Sink,
    stopped: bool,
}

impl RodioVoice {
    fn new(sink: Sink) -> Self {
        Self {
            sink,
            stopped: false,
        }
    }
}

impl Voice for RodioVoice {
    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.sink.stop();
            self.stopped = true;
        }
    }

    fn is_active(&self) -> bool {
        !self.stopped && !self.sink.empty()
    }
}

impl Drop for RodioVoice {
    fn drop(&mut self) {
        if !self.stopped {
            warn!("Voice dropped without stop; stopping now");
            self.stop();
        }
    }
}

impl std::fmt::Debug for RodioVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioVoice")
            .field("stopped", &self.stopped)
            .field("volume", &self.sink.volume())
            .finish()
    }
}
