//! Encoding of [`TimerSnapshot`] as three `timer.*` keys.

use crate::types::{PomodoroConfig, TimerPhase, TimerSnapshot};

use super::{KeyValueStore, StoreError};

/// Remaining seconds in the current phase, as a decimal integer.
pub const KEY_SECONDS_REMAINING: &str = "timer.secondsRemaining";

/// Current phase, `WORK` or `BREAK`.
pub const KEY_PHASE: &str = "timer.phase";

/// Whether the countdown is running, `true` or `false`.
pub const KEY_RUNNING: &str = "timer.running";

const ALL_KEYS: [&str; 3] = [KEY_SECONDS_REMAINING, KEY_PHASE, KEY_RUNNING];

/// Reads the persisted snapshot.
///
/// Returns `Ok(None)` when no snapshot has ever been written.
///
/// # Errors
///
/// Returns `StoreError::PersistedStateCorrupt` if only some of the keys are
/// present, a value does not parse, or the remaining time exceeds the
/// configured length of its phase. Storage errors are passed through.
pub fn load_snapshot<S: KeyValueStore + ?Sized>(
    store: &S,
    config: &PomodoroConfig,
) -> Result<Option<TimerSnapshot>, StoreError> {
    let seconds = store.get(KEY_SECONDS_REMAINING)?;
    let phase = store.get(KEY_PHASE)?;
    let running = store.get(KEY_RUNNING)?;

    let (seconds, phase, running) = match (seconds, phase, running) {
        (None, None, None) => return Ok(None),
        (Some(s), Some(p), Some(r)) => (s, p, r),
        _ => {
            return Err(StoreError::PersistedStateCorrupt(
                "incomplete timer snapshot".to_string(),
            ))
        }
    };

    let seconds_remaining = seconds.trim().parse::<u32>().map_err(|e| {
        StoreError::PersistedStateCorrupt(format!("{KEY_SECONDS_REMAINING}={seconds:?}: {e}"))
    })?;
    let phase = phase
        .trim()
        .parse::<TimerPhase>()
        .map_err(|e| StoreError::PersistedStateCorrupt(format!("{KEY_PHASE}: {e}")))?;
    let running = running.trim().parse::<bool>().map_err(|e| {
        StoreError::PersistedStateCorrupt(format!("{KEY_RUNNING}={running:?}: {e}"))
    })?;

    let snapshot = TimerSnapshot {
        seconds_remaining,
        phase,
        running,
    };
    if !snapshot.is_valid_for(config) {
        return Err(StoreError::PersistedStateCorrupt(format!(
            "{} seconds exceeds the {} duration",
            snapshot.seconds_remaining, snapshot.phase
        )));
    }

    Ok(Some(snapshot))
}

/// Writes all three snapshot keys as one update.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn save_snapshot<S: KeyValueStore + ?Sized>(
    store: &mut S,
    snapshot: &TimerSnapshot,
) -> Result<(), StoreError> {
    store.set_many(&[
        (KEY_SECONDS_REMAINING, snapshot.seconds_remaining.to_string()),
        (KEY_PHASE, snapshot.phase.as_str().to_string()),
        (KEY_RUNNING, snapshot.running.to_string()),
    ])
}

/// Removes all snapshot keys.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_snapshot<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove_many(&ALL_KEYS)
}
