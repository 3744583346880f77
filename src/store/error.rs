//! Persistence error types.

use thiserror::Error;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("状態ファイルの入出力に失敗しました: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data could not be (de)serialized.
    #[error("状態データのシリアライズに失敗しました: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted timer snapshot was present but unusable.
    #[error("保存されたタイマー状態が破損しています: {0}")]
    PersistedStateCorrupt(String),
}

impl StoreError {
    /// Returns true if the error concerns the content of the stored data
    /// rather than access to it.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::PersistedStateCorrupt(_))
    }
}
