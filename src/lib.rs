//! focusnoise Library
//!
//! This library provides the core functionality for the focusnoise CLI.
//! It includes:
//! - Procedural white and pink noise synthesis
//! - Ambient playback controller with a single live voice
//! - Focus timer engine with WORK/BREAK phases and a one-second tick loop
//! - Key-value persistence of the timer snapshot
//! - User settings and CLI command parsing and display utilities

pub mod cli;
pub mod config;
pub mod sound;
pub mod store;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{PomodoroConfig, TimerPhase, TimerSnapshot};

// Re-export sound types
pub use sound::{
    AudioBackend, CustomTrack, MockAudioBackend, NoiseBuffer, NoiseKind, PlaybackController,
    RodioBackend, SoundConfig, SoundError, SourceType, Voice,
};

// Re-export timer types
pub use timer::{PomodoroEngine, SharedEngine, Ticker, TimerEvent};

// Re-export store types
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};

// Re-export settings
pub use config::{Settings, SoundSettings};
