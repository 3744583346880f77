//! Sound source selection.
//!
//! This module defines what the ambient player can play: synthesized white
//! or pink noise, or a user-supplied track held in memory.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::SoundError;
use super::noise::NoiseKind;

/// Largest custom track accepted for in-memory playback (50 MiB).
pub const DEFAULT_MAX_TRACK_BYTES: u64 = 50 * 1024 * 1024;

/// Default playback volume.
pub const DEFAULT_VOLUME: f32 = 0.5;

// ============================================================================
// SourceType
// ============================================================================

/// The kind of sound the player produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Synthesized white noise
    #[default]
    White,
    /// Synthesized pink noise
    Pink,
    /// A user-supplied track
    Custom,
}

impl SourceType {
    /// Returns the string representation of the source type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::White => "white",
            SourceType::Pink => "pink",
            SourceType::Custom => "custom",
        }
    }

    /// Returns the short label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            SourceType::White => "White",
            SourceType::Pink => "Rain",
            SourceType::Custom => "Custom",
        }
    }

    /// Returns the noise algorithm for synthesized sources.
    pub fn noise_kind(&self) -> Option<NoiseKind> {
        match self {
            SourceType::White => Some(NoiseKind::White),
            SourceType::Pink => Some(NoiseKind::Pink),
            SourceType::Custom => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(SourceType::White),
            "pink" | "rain" => Ok(SourceType::Pink),
            "custom" => Ok(SourceType::Custom),
            other => Err(format!(
                "不明なサウンド種別です: {other} (white, pink, custom のいずれかを指定してください)"
            )),
        }
    }
}

// ============================================================================
// CustomTrack
// ============================================================================

/// A user-supplied audio file held in memory.
///
/// The bytes are treated as an opaque blob and only decoded when playback
/// starts. Clones share the same bytes.
#[derive(Clone)]
pub struct CustomTrack {
    name: String,
    data: Arc<[u8]>,
}

impl CustomTrack {
    /// Loads a track from a file, rejecting it before reading if it is
    /// larger than `max_bytes`.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the file cannot be opened and
    /// `SoundError::TrackTooLarge` if it exceeds the ceiling.
    pub fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self, SoundError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(SoundError::FileNotFound(format!(
                "{}: not a regular file",
                path.display()
            )));
        }
        check_size(metadata.len(), max_bytes)?;

        let data = fs::read(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        // The file may have grown between the metadata check and the read.
        check_size(data.len() as u64, max_bytes)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            data: data.into(),
        })
    }

    /// Wraps bytes already in memory.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::TrackTooLarge` if `bytes` exceeds `max_bytes`.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        max_bytes: u64,
    ) -> Result<Self, SoundError> {
        let bytes = bytes.into();
        check_size(bytes.len() as u64, max_bytes)?;
        Ok(Self {
            name: name.into(),
            data: bytes.into(),
        })
    }

    /// Returns the display name (the file name for tracks loaded from disk).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the size of the track in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns a shared handle to the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

impl fmt::Debug for CustomTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTrack")
            .field("name", &self.name)
            .field("size", &self.data.len())
            .finish()
    }
}

fn check_size(size: u64, limit: u64) -> Result<(), SoundError> {
    if size > limit {
        return Err(SoundError::TrackTooLarge { size, limit });
    }
    Ok(())
}

// ============================================================================
// SoundConfig
// ============================================================================

/// The player's current selection.
#[derive(Debug, Clone)]
pub struct SoundConfig {
    /// What to play
    pub source_type: SourceType,
    /// Playback volume in [0, 1]
    pub volume: f32,
    /// Track used when `source_type` is `Custom`
    pub custom_track: Option<CustomTrack>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            source_type: SourceType::default(),
            volume: DEFAULT_VOLUME,
            custom_track: None,
        }
    }
}

/// Clamps a requested volume into [0, 1]. NaN becomes silence.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
