//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer phases (WORK / BREAK)
//! - Timer configuration with validation
//! - The persisted timer snapshot

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// TimerPhase
// ============================================================================

/// Represents the current phase of the focus timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPhase {
    /// Focused work interval
    #[default]
    Work,
    /// Break interval between work sessions
    Break,
}

impl TimerPhase {
    /// Returns the persisted string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Work => "WORK",
            TimerPhase::Break => "BREAK",
        }
    }

    /// Returns the phase that follows this one.
    pub fn next(&self) -> Self {
        match self {
            TimerPhase::Work => TimerPhase::Break,
            TimerPhase::Break => TimerPhase::Work,
        }
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WORK" => Ok(TimerPhase::Work),
            "BREAK" => Ok(TimerPhase::Break),
            other => Err(format!("unknown timer phase: {other:?}")),
        }
    }
}

// ============================================================================
// PomodoroConfig
// ============================================================================

fn default_work_minutes() -> u32 {
    25
}

fn default_break_minutes() -> u32 {
    5
}

/// Configuration for the focus timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    /// Work duration in minutes (1-120)
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Break duration in minutes (1-60)
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl PomodoroConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified break duration.
    pub fn with_break_minutes(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.work_minutes < 1 || self.work_minutes > 120 {
            return Err("作業時間は1-120分の範囲で指定してください".to_string());
        }
        if self.break_minutes < 1 || self.break_minutes > 60 {
            return Err("休憩時間は1-60分の範囲で指定してください".to_string());
        }
        Ok(())
    }

    /// Returns the configured length of `phase` in seconds.
    ///
    /// Saturates for unvalidated configurations instead of overflowing.
    pub fn duration_secs(&self, phase: TimerPhase) -> u32 {
        match phase {
            TimerPhase::Work => self.work_minutes.saturating_mul(60),
            TimerPhase::Break => self.break_minutes.saturating_mul(60),
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// The persisted state of the focus timer.
///
/// Written on every tick and transition, read once when an engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Seconds left in the current phase
    pub seconds_remaining: u32,
    /// Current phase
    pub phase: TimerPhase,
    /// Whether the countdown is running
    pub running: bool,
}

impl TimerSnapshot {
    /// Returns the initial snapshot: a full, paused WORK interval.
    pub fn initial(config: &PomodoroConfig) -> Self {
        Self {
            seconds_remaining: config.duration_secs(TimerPhase::Work),
            phase: TimerPhase::Work,
            running: false,
        }
    }

    /// Returns true if the snapshot fits the phase durations in `config`.
    pub fn is_valid_for(&self, config: &PomodoroConfig) -> bool {
        self.seconds_remaining <= config.duration_secs(self.phase)
    }
}

// ============================================================================
// Tests
// ============================================================================
