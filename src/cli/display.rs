//! Display utilities for the focusnoise CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - Session events

use crate::sound::{SoundError, SourceType};
use crate::types::{TimerPhase, TimerSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the saved timer state.
    pub fn show_status(snapshot: Option<&TimerSnapshot>) {
        println!("focusnoise ステータス");
        println!("─────────────────────────────");

        match snapshot {
            Some(snapshot) => {
                println!("フェーズ: {}", Self::phase_label(snapshot.phase));
                println!("残り時間: {}", Self::clock(snapshot.seconds_remaining));
                println!(
                    "状態: {}",
                    if snapshot.running {
                        "実行中"
                    } else {
                        "一時停止中"
                    }
                );
            }
            None => {
                println!("保存されたタイマーはありません");
            }
        }
    }

    /// Shows a success message for a reset.
    pub fn show_reset_success(snapshot: &TimerSnapshot) {
        println!("[] タイマーをリセットしました");
        println!("  残り時間: {}", Self::clock(snapshot.seconds_remaining));
    }

    /// Shows a success message for clearing the saved timer.
    pub fn show_clear_success() {
        println!("[] 保存されたタイマーを削除しました");
    }

    /// Shows the session banner and key help.
    pub fn show_session_help(sound_enabled: bool) {
        println!("focusnoise - s: 開始/一時停止  r: リセット  q: 終了");
        if sound_enabled {
            println!("  w: White  p: Rain  c: Custom  +/-: 音量  m: サウンド切替  l <パス>: ファイル読込");
        }
    }

    /// Shows the timer line.
    pub fn show_timer(snapshot: &TimerSnapshot) {
        let marker = if snapshot.running { ">" } else { "||" };
        println!(
            "{} {} {}",
            marker,
            Self::phase_label(snapshot.phase),
            Self::clock(snapshot.seconds_remaining)
        );
    }

    /// Shows the work completion message.
    pub fn show_work_completed(completed_sessions: u32, points: u32) {
        println!(
            "* 集中セッション完了! +{} pts (このセッションで {} 回目)",
            points, completed_sessions
        );
        println!("  休憩しましょう");
    }

    /// Shows the break completion message.
    pub fn show_break_completed() {
        println!("* 休憩終了 - 次の集中セッションを始めます");
    }

    /// Shows the sound line.
    pub fn show_sound(source: SourceType, volume: f32, playing: bool) {
        let state = if playing { "再生中" } else { "停止中" };
        println!(
            "~ サウンド: {} 音量: {}% ({})",
            source.label(),
            Self::volume_percent(volume),
            state
        );
    }

    /// Shows that ambient sound is turned off for this session.
    pub fn show_sound_disabled() {
        println!("~ サウンドは無効です (--no-sound)");
    }

    /// Shows the end-of-session summary.
    pub fn show_session_summary(completed_sessions: u32, points: u32) {
        println!("セッションを終了しました");
        if completed_sessions > 0 {
            println!("  完了した集中セッション: {} 回 (+{} pts)", completed_sessions, points);
        }
    }

    /// Shows a sound error with a hint.
    pub fn show_sound_error(error: &SoundError) {
        eprintln!("サウンドエラー: {}", error);
        eprintln!("  ヒント: {}", error.suggestion());
    }

    /// Shows a message for an unknown session command.
    pub fn show_unknown_command(input: &str) {
        eprintln!("不明なコマンドです: {}", input);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Returns the label for a phase.
    pub fn phase_label(phase: TimerPhase) -> &'static str {
        match phase {
            TimerPhase::Work => "Deep Focus",
            TimerPhase::Break => "Break Time",
        }
    }

    /// Formats seconds as `MM:SS`.
    pub fn clock(total_seconds: u32) -> String {
        let (minutes, seconds) = Self::format_time(total_seconds);
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }

    fn volume_percent(volume: f32) -> u32 {
        (volume * 100.0).round() as u32
    }
}

// ============================================================================
// Tests
// ============================================================================
