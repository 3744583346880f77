//! Key-value persistence for the focus timer.
//!
//! The timer only needs a narrow port: read a key, and write or remove a
//! group of keys together so a reader never sees half of an update.
//!
//! - [`MemoryStore`]: shared in-memory map (tests, embedding)
//! - [`JsonFileStore`]: a single JSON object file on disk
//! - [`snapshot`]: the `timer.*` key layout and its codec

mod error;
mod file;
mod memory;
pub mod snapshot;

pub use error::StoreError;
pub use file::{default_state_path, JsonFileStore, STATE_DIR_NAME, STATE_FILE_NAME};
pub use memory::MemoryStore;
pub use snapshot::{
    clear_snapshot, load_snapshot, save_snapshot, KEY_PHASE, KEY_RUNNING, KEY_SECONDS_REMAINING,
};

/// Trait for persisted key-value storage.
///
/// Values are plain strings; callers own the encoding of their keys.
pub trait KeyValueStore {
    /// Reads a single key. Returns `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes all `entries` as one update.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Removes all `keys` as one update. Absent keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove_many(&mut self, keys: &[&str]) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        (**self).set_many(entries)
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<(), StoreError> {
        (**self).remove_many(keys)
    }
}
