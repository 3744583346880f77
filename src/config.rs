//! User settings.
//!
//! Settings are read from `~/.focusnoise/config.json`. Every field has a
//! default, so the file may be absent or list only the values to change.
//! Command-line flags override file values.
//!
//! ```json
//! {
//!   "timer": { "work_minutes": 50, "break_minutes": 10 },
//!   "sound": { "source": "pink", "volume": 0.3, "follow_timer": true }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sound::noise::{
    DEFAULT_BUFFER_SECONDS, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SECONDS, MAX_SAMPLE_RATE,
};
use crate::sound::{SourceType, DEFAULT_MAX_TRACK_BYTES, DEFAULT_VOLUME};
use crate::store::{default_state_path, STATE_DIR_NAME};
use crate::types::PomodoroConfig;

/// File name of the settings file.
pub const CONFIG_FILE_NAME: &str = "config.json";

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Returns the default settings path (`~/.focusnoise/config.json`).
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_buffer_seconds() -> f32 {
    DEFAULT_BUFFER_SECONDS
}

fn default_max_track_megabytes() -> u64 {
    DEFAULT_MAX_TRACK_BYTES / BYTES_PER_MEGABYTE
}

// ============================================================================
// SoundSettings
// ============================================================================

/// Ambient sound settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    /// Sound played when the session starts.
    #[serde(default)]
    pub source: SourceType,

    /// Initial volume (0.0-1.0).
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Sample rate for synthesized noise in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Length of the looped noise buffer in seconds.
    #[serde(default = "default_buffer_seconds")]
    pub buffer_seconds: f32,

    /// Largest custom track accepted, in MiB.
    #[serde(default = "default_max_track_megabytes")]
    pub max_track_megabytes: u64,

    /// Play sound only while a work interval is running.
    #[serde(default)]
    pub follow_timer: bool,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            source: SourceType::default(),
            volume: default_volume(),
            sample_rate: default_sample_rate(),
            buffer_seconds: default_buffer_seconds(),
            max_track_megabytes: default_max_track_megabytes(),
            follow_timer: false,
        }
    }
}

impl SoundSettings {
    /// Returns the custom track ceiling in bytes.
    #[must_use]
    pub fn max_track_bytes(&self) -> u64 {
        self.max_track_megabytes.saturating_mul(BYTES_PER_MEGABYTE)
    }
}

// ============================================================================
// Settings
// ============================================================================

/// All user settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Timer durations.
    #[serde(default)]
    pub timer: PomodoroConfig,

    /// Ambient sound.
    #[serde(default)]
    pub sound: SoundSettings,

    /// Where the timer snapshot is stored. Defaults to `~/.focusnoise/state.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable, is not valid
    /// JSON, or fails [`validate`](Self::validate).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("設定ファイルの形式が不正です: {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("設定ファイルの値が不正です: {}", path.display()))?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.timer.validate().map_err(anyhow::Error::msg)?;

        if !(0.0..=1.0).contains(&self.sound.volume) {
            bail!("音量は0.0-1.0の範囲で指定してください");
        }
        if !(1..=MAX_SAMPLE_RATE).contains(&self.sound.sample_rate) {
            bail!(
                "サンプルレートは1-{}Hzの範囲で指定してください",
                MAX_SAMPLE_RATE
            );
        }
        let buffer_seconds = self.sound.buffer_seconds;
        if !buffer_seconds.is_finite()
            || buffer_seconds <= 0.0
            || buffer_seconds > MAX_BUFFER_SECONDS
        {
            bail!(
                "ノイズバッファの長さは{}秒以下の正の値を指定してください",
                MAX_BUFFER_SECONDS
            );
        }
        if self.sound.max_track_megabytes == 0 {
            bail!("サウンドファイルの上限サイズは1MB以上を指定してください");
        }
        Ok(())
    }

    /// Returns the state file path, falling back to the default location.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_path.clone().unwrap_or_else(default_state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn test_default_settings() {
            let settings = Settings::default();

            assert_eq!(settings.timer.work_minutes, 25);
            assert_eq!(settings.timer.break_minutes, 5);
            assert_eq!(settings.sound.source, SourceType::White);
            assert_eq!(settings.sound.volume, 0.5);
            assert_eq!(settings.sound.sample_rate, 44_100);
            assert_eq!(settings.sound.buffer_seconds, 2.0);
            assert_eq!(settings.sound.max_track_megabytes, 50);
            assert!(!settings.sound.follow_timer);
            assert!(settings.state_path.is_none());
            assert!(settings.validate().is_ok());
        }

        #[test]
        fn test_max_track_bytes() {
            let settings = SoundSettings::default();
            assert_eq!(settings.max_track_bytes(), DEFAULT_MAX_TRACK_BYTES);
        }

        #[test]
        fn test_default_paths() {
            assert!(default_config_path().ends_with(".focusnoise/config.json"));
            assert!(Settings::default()
                .state_path()
                .ends_with(".focusnoise/state.json"));
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_missing_file_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let settings = Settings::load_from(dir.path().join("none.json")).unwrap();
            assert_eq!(settings, Settings::default());
        }

        #[test]
        fn test_partial_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.json");
            fs::write(
                &path,
                r#"{"timer": {"work_minutes": 50}, "sound": {"source": "pink", "follow_timer": true}}"#,
            )
            .unwrap();

            let settings = Settings::load_from(&path).unwrap();

            assert_eq!(settings.timer.work_minutes, 50);
            assert_eq!(settings.timer.break_minutes, 5);
            assert_eq!(settings.sound.source, SourceType::Pink);
            assert_eq!(settings.sound.volume, 0.5);
            assert!(settings.sound.follow_timer);
        }

        #[test]
        fn test_state_path_override() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.json");
            fs::write(&path, r#"{"state_path": "/tmp/focus-state.json"}"#).unwrap();

            let settings = Settings::load_from(&path).unwrap();
            assert_eq!(settings.state_path(), PathBuf::from("/tmp/focus-state.json"));
        }

        #[test]
        fn test_malformed_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.json");
            fs::write(&path, "{ not json").unwrap();

            let err = Settings::load_from(&path).unwrap_err();
            assert!(err.to_string().contains("形式が不正"));
        }

        #[test]
        fn test_invalid_values_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.json");
            fs::write(&path, r#"{"timer": {"work_minutes": 0}}"#).unwrap();

            let err = Settings::load_from(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("作業時間"));
        }

        #[test]
        fn test_huge_buffer_in_file_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.json");
            fs::write(&path, r#"{"sound": {"buffer_seconds": 1e30}}"#).unwrap();

            let err = Settings::load_from(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("ノイズバッファ"));
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn test_volume_out_of_range() {
            let mut settings = Settings::default();
            settings.sound.volume = 1.5;
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_zero_sample_rate() {
            let mut settings = Settings::default();
            settings.sound.sample_rate = 0;
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_non_positive_buffer() {
            let mut settings = Settings::default();
            settings.sound.buffer_seconds = 0.0;
            assert!(settings.validate().is_err());

            settings.sound.buffer_seconds = f32::NAN;
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_oversized_buffer() {
            let mut settings = Settings::default();
            settings.sound.buffer_seconds = 1.0e30;
            let err = settings.validate().unwrap_err();
            assert!(err.to_string().contains("ノイズバッファ"));

            settings.sound.buffer_seconds = MAX_BUFFER_SECONDS;
            assert!(settings.validate().is_ok());
        }

        #[test]
        fn test_oversized_sample_rate() {
            let mut settings = Settings::default();
            settings.sound.sample_rate = u32::MAX;
            let err = settings.validate().unwrap_err();
            assert!(err.to_string().contains("サンプルレート"));

            settings.sound.sample_rate = MAX_SAMPLE_RATE;
            assert!(settings.validate().is_ok());
        }

        #[test]
        fn test_zero_track_ceiling() {
            let mut settings = Settings::default();
            settings.sound.max_track_megabytes = 0;
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_break_out_of_range() {
            let mut settings = Settings::default();
            settings.timer.break_minutes = 61;
            let err = settings.validate().unwrap_err();
            assert!(err.to_string().contains("休憩時間"));
        }
    }
}
