//! Command definitions for the focusnoise CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::sound::SourceType;

// ============================================================================
// CLI Structure
// ============================================================================

/// focusnoise - ambient noise and a focus timer in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "focusnoise",
    version,
    about = "環境ノイズ付きポモドーロタイマーCLI",
    long_about = "ホワイトノイズ・ピンクノイズ・任意のサウンドファイルを再生しながら、\n\
                  作業と休憩を交互に計測するシンプルなポモドーロタイマー。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run an interactive focus session
    Run(RunArgs),

    /// Show the saved timer state
    Status {
        /// State file path (default: ~/.focusnoise/state.json)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Reset the saved timer to a fresh work interval
    Reset {
        /// State file path (default: ~/.focusnoise/state.json)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Forget the saved timer instead of saving a fresh one
        #[arg(long)]
        clear: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command.
///
/// Options left unset fall back to the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Work duration in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub work: Option<u32>,

    /// Break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub break_time: Option<u32>,

    /// Ambient sound (white, pink, custom)
    #[arg(short, long)]
    pub sound: Option<SourceType>,

    /// Volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Audio file to load as the custom sound
    #[arg(short, long)]
    pub track: Option<PathBuf>,

    /// Play sound only while a work interval is running
    #[arg(short, long)]
    pub follow_timer: bool,

    /// Disable ambient sound
    #[arg(long)]
    pub no_sound: bool,

    /// State file path (default: ~/.focusnoise/state.json)
    #[arg(long)]
    pub state: Option<PathBuf>,
}

impl RunArgs {
    /// Overrides `settings` with the options given on the command line.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(work) = self.work {
            settings.timer.work_minutes = work;
        }
        if let Some(break_time) = self.break_time {
            settings.timer.break_minutes = break_time;
        }
        if let Some(sound) = self.sound {
            settings.sound.source = sound;
        }
        if let Some(volume) = self.volume {
            settings.sound.volume = volume;
        }
        if self.track.is_some() {
            settings.sound.source = SourceType::Custom;
        }
        if self.follow_timer {
            settings.sound.follow_timer = true;
        }
        if let Some(state) = &self.state {
            settings.state_path = Some(state.clone());
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the volume.
///
/// - Must be a number
/// - Must be within 0.0-1.0
fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("音量は数値で指定してください: {s}"))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("音量は0.0-1.0の範囲で指定してください".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================
