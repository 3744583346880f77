//! Sound system error types.
//!
//! This module defines the error types for noise synthesis and ambient
//! playback. Apart from `InvalidParameter`, every error is recoverable:
//! the caller can prompt the user or retry after an interaction.

use thiserror::Error;

/// Errors that can occur in the sound system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// A synthesis request had an unusable parameter.
    #[error("不正なパラメータです: {0}")]
    InvalidParameter(String),

    /// Custom playback was requested but no track has been loaded.
    #[error("カスタム音源が設定されていません")]
    NoSourceConfigured,

    /// The platform refused to start audio output.
    #[error("オーディオ再生が開始できません: {0}")]
    PlaybackBlocked(String),

    /// Sound file was not found at the specified path.
    #[error("サウンドファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// Sound file exceeds the in-memory size ceiling.
    #[error("サウンドファイルが大きすぎます: {size} バイト (上限 {limit} バイト)")]
    TrackTooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },

    /// Failed to decode the audio data.
    #[error("サウンドファイルのデコードに失敗しました: {0}")]
    DecodeError(String),

    /// Failed to create an output sink on an open stream.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),
}

impl SoundError {
    /// Returns true if the caller can recover by retrying or by changing input.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidParameter(_))
    }

    /// Returns true if this error is related to the audio device.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::PlaybackBlocked(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to a custom track file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::TrackTooLarge { .. } | Self::DecodeError(_)
        )
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "設定値を確認してください",
            Self::NoSourceConfigured => "再生するサウンドファイルを読み込んでください",
            Self::PlaybackBlocked(_) => "オーディオデバイスを確認してから再度再生してください",
            Self::FileNotFound(_) => "ファイルのパスを確認してください",
            Self::TrackTooLarge { .. } => "より小さいサウンドファイルを選択してください",
            Self::DecodeError(_) => "サウンドファイルが破損している可能性があります",
            Self::StreamError(_) => "オーディオ設定を確認してください",
        }
    }
}
