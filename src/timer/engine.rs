//! Focus timer engine.
//!
//! This module provides the WORK/BREAK state machine:
//! - State transitions (Work → Break → Work ...)
//! - Countdown driven one second at a time by [`super::Ticker`]
//! - Snapshot persistence on every tick and transition
//! - Reward callback for completed work intervals

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::store::{self, KeyValueStore};
use crate::types::{PomodoroConfig, TimerPhase, TimerSnapshot};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for display and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started or resumed
    Started {
        /// Phase being counted down
        phase: TimerPhase,
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Countdown paused
    Paused {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Timer returned to a fresh work interval
    Reset,
    /// One second elapsed
    Tick {
        /// Phase being counted down
        phase: TimerPhase,
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Work interval completed
    WorkCompleted {
        /// Work intervals completed in this session
        completed_sessions: u32,
    },
    /// Break interval completed
    BreakCompleted,
}

/// Callback invoked once per completed work interval.
pub type RewardCallback = Box<dyn FnMut() + Send>;

// ============================================================================
// PomodoroEngine
// ============================================================================

/// State machine over WORK/BREAK phases with a persisted countdown.
pub struct PomodoroEngine {
    /// Phase durations
    config: PomodoroConfig,
    /// Current (and last persisted) state
    snapshot: TimerSnapshot,
    /// Persistence port for the snapshot
    store: Box<dyn KeyValueStore + Send>,
    /// Invoked when a work interval completes
    on_work_complete: Option<RewardCallback>,
    /// Optional event subscriber
    event_tx: Option<mpsc::UnboundedSender<TimerEvent>>,
    /// Publishes `running` to the tick loop
    running_tx: watch::Sender<bool>,
    /// Work intervals completed since construction
    completed_sessions: u32,
}

impl PomodoroEngine {
    /// Creates an engine, resuming the snapshot persisted in `store` if any.
    ///
    /// A missing snapshot starts a fresh, paused work interval. A corrupt one
    /// is logged and replaced by that same initial state. A read failure also
    /// starts fresh but leaves the stored data untouched.
    pub fn new(config: PomodoroConfig, store: impl KeyValueStore + Send + 'static) -> Self {
        let mut store: Box<dyn KeyValueStore + Send> = Box::new(store);

        let snapshot = match store::load_snapshot(store.as_ref(), &config) {
            Ok(Some(snapshot)) => {
                info!(
                    "Resuming {} with {}s remaining (running: {})",
                    snapshot.phase, snapshot.seconds_remaining, snapshot.running
                );
                snapshot
            }
            Ok(None) => TimerSnapshot::initial(&config),
            Err(e) if e.is_corrupt_data() => {
                warn!("Discarding persisted timer state: {}", e);
                let initial = TimerSnapshot::initial(&config);
                if let Err(e) = store::save_snapshot(store.as_mut(), &initial) {
                    warn!("Failed to persist timer state: {}", e);
                }
                initial
            }
            Err(e) => {
                // Unreadable storage may still hold a good snapshot; leave it alone.
                warn!("Failed to read persisted timer state: {}", e);
                TimerSnapshot::initial(&config)
            }
        };

        let (running_tx, _) = watch::channel(snapshot.running);

        Self {
            config,
            snapshot,
            store,
            on_work_complete: None,
            event_tx: None,
            running_tx,
            completed_sessions: 0,
        }
    }

    /// Sets the callback invoked once per completed work interval.
    pub fn with_reward_callback(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_work_complete = Some(Box::new(callback));
        self
    }

    /// Sets the channel that receives [`TimerEvent`]s.
    pub fn with_event_sender(mut self, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Starts (or resumes) the countdown. Does nothing if already running.
    pub fn start(&mut self) {
        if self.snapshot.running {
            return;
        }

        self.snapshot.running = true;
        self.persist();
        self.running_tx.send_replace(true);
        debug!("Timer started ({}s left)", self.snapshot.seconds_remaining);

        self.emit(TimerEvent::Started {
            phase: self.snapshot.phase,
            remaining_seconds: self.snapshot.seconds_remaining,
        });
    }

    /// Pauses the countdown. No time passes until [`start`](Self::start).
    pub fn pause(&mut self) {
        if !self.snapshot.running {
            return;
        }

        self.snapshot.running = false;
        self.persist();
        self.running_tx.send_replace(false);
        debug!("Timer paused ({}s left)", self.snapshot.seconds_remaining);

        self.emit(TimerEvent::Paused {
            remaining_seconds: self.snapshot.seconds_remaining,
        });
    }

    /// Starts the countdown if paused, pauses it if running.
    pub fn toggle(&mut self) {
        if self.snapshot.running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Returns to a full, paused work interval from any state.
    pub fn reset(&mut self) {
        self.snapshot = TimerSnapshot::initial(&self.config);
        self.persist();
        self.running_tx.send_replace(false);
        debug!("Timer reset");

        self.emit(TimerEvent::Reset);
    }

    /// Advances the countdown by one second.
    ///
    /// Does nothing while paused. Returns true if this tick completed a phase.
    pub fn tick(&mut self) -> bool {
        if !self.snapshot.running {
            return false;
        }

        self.snapshot.seconds_remaining = self.snapshot.seconds_remaining.saturating_sub(1);
        self.emit(TimerEvent::Tick {
            phase: self.snapshot.phase,
            remaining_seconds: self.snapshot.seconds_remaining,
        });

        let completed = self.snapshot.seconds_remaining == 0;
        if completed {
            self.complete_phase();
        }

        self.persist();
        completed
    }

    /// Handles the end of the current phase.
    fn complete_phase(&mut self) {
        match self.snapshot.phase {
            TimerPhase::Work => {
                self.completed_sessions += 1;
                info!("Work interval completed (#{})", self.completed_sessions);

                if let Some(callback) = self.on_work_complete.as_mut() {
                    callback();
                }
                self.emit(TimerEvent::WorkCompleted {
                    completed_sessions: self.completed_sessions,
                });
            }
            TimerPhase::Break => {
                info!("Break completed");
                self.emit(TimerEvent::BreakCompleted);
            }
        }

        let next = self.snapshot.phase.next();
        self.snapshot.phase = next;
        self.snapshot.seconds_remaining = self.config.duration_secs(next);
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    /// Returns the current phase.
    pub fn phase(&self) -> TimerPhase {
        self.snapshot.phase
    }

    /// Returns the seconds left in the current phase.
    pub fn seconds_remaining(&self) -> u32 {
        self.snapshot.seconds_remaining
    }

    /// Returns true while the countdown is running.
    pub fn is_running(&self) -> bool {
        self.snapshot.running
    }

    /// Returns the number of work intervals completed by this engine.
    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    /// Returns the timer configuration.
    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    /// Returns a receiver that observes the `running` flag.
    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.running_tx.subscribe()
    }

    fn persist(&mut self) {
        if let Err(e) = store::save_snapshot(self.store.as_mut(), &self.snapshot) {
            warn!("Failed to persist timer state: {}", e);
        }
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(tx) = &self.event_tx {
            // A dropped receiver just means nobody is listening any more.
            let _ = tx.send(event);
        }
    }
}

impl std::fmt::Debug for PomodoroEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PomodoroEngine")
            .field("config", &self.config)
            .field("snapshot", &self.snapshot)
            .field("completed_sessions", &self.completed_sessions)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::store::{MemoryStore, StoreError, KEY_PHASE, KEY_RUNNING, KEY_SECONDS_REMAINING};

    /// A store whose reads always fail, counting attempted writes.
    #[derive(Default)]
    struct UnreadableStore {
        writes: Arc<AtomicU32>,
    }

    impl KeyValueStore for UnreadableStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }

        fn set_many(&mut self, _entries: &[(&str, String)]) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn remove_many(&mut self, _keys: &[&str]) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn seeded_store(seconds: u32, phase: TimerPhase, running: bool) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(KEY_SECONDS_REMAINING, seconds.to_string());
        store.insert(KEY_PHASE, phase.as_str());
        store.insert(KEY_RUNNING, running.to_string());
        store
    }

    fn create_engine() -> (PomodoroEngine, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine =
            PomodoroEngine::new(PomodoroConfig::default(), MemoryStore::new()).with_event_sender(tx);
        (engine, rx)
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    mod construction_tests {
        use super::*;

        #[test]
        fn test_new_engine_defaults() {
            let (engine, _rx) = create_engine();

            assert_eq!(engine.phase(), TimerPhase::Work);
            assert_eq!(engine.seconds_remaining(), 25 * 60);
            assert!(!engine.is_running());
            assert_eq!(engine.completed_sessions(), 0);
        }

        #[test]
        fn test_resumes_persisted_snapshot() {
            let store = seeded_store(42, TimerPhase::Break, true);
            let engine = PomodoroEngine::new(PomodoroConfig::default(), store);

            assert_eq!(
                engine.snapshot(),
                TimerSnapshot {
                    seconds_remaining: 42,
                    phase: TimerPhase::Break,
                    running: true,
                }
            );
            assert!(*engine.subscribe_running().borrow());
        }

        #[test]
        fn test_corrupt_snapshot_falls_back_to_defaults() {
            let store = MemoryStore::new();
            store.insert(KEY_SECONDS_REMAINING, "not a number");
            store.insert(KEY_PHASE, "BREAK");
            store.insert(KEY_RUNNING, "true");

            let engine = PomodoroEngine::new(PomodoroConfig::default(), store.clone());

            assert_eq!(engine.snapshot(), TimerSnapshot::initial(&PomodoroConfig::default()));
            // The corrupt data is overwritten with the defaults
            assert_eq!(store.get(KEY_SECONDS_REMAINING).unwrap().as_deref(), Some("1500"));
            assert_eq!(store.get(KEY_PHASE).unwrap().as_deref(), Some("WORK"));
        }

        #[test]
        fn test_unreadable_store_is_not_overwritten() {
            let store = UnreadableStore::default();
            let writes = Arc::clone(&store.writes);

            let engine = PomodoroEngine::new(PomodoroConfig::default(), store);

            assert_eq!(engine.snapshot(), TimerSnapshot::initial(&PomodoroConfig::default()));
            assert_eq!(writes.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_snapshot_longer_than_phase_is_discarded() {
            let store = seeded_store(10_000, TimerPhase::Work, true);
            let engine = PomodoroEngine::new(PomodoroConfig::default(), store);
            assert_eq!(engine.seconds_remaining(), 1500);
            assert!(!engine.is_running());
        }
    }

    // ------------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------------

    mod control_tests {
        use super::*;

        #[test]
        fn test_start() {
            let (mut engine, mut rx) = create_engine();

            engine.start();

            assert!(engine.is_running());
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Started {
                    phase: TimerPhase::Work,
                    remaining_seconds: 1500
                }
            );
        }

        #[test]
        fn test_start_already_running_is_noop() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();
            engine.start();

            assert!(engine.is_running());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_pause() {
            let (mut engine, mut rx) = create_engine();

            engine.start();
            let _ = rx.try_recv();
            engine.pause();

            assert!(!engine.is_running());
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Paused {
                    remaining_seconds: 1500
                }
            );
        }

        #[test]
        fn test_pause_not_running_is_noop() {
            let (mut engine, mut rx) = create_engine();
            engine.pause();
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_toggle() {
            let (mut engine, _rx) = create_engine();

            engine.toggle();
            assert!(engine.is_running());
            engine.toggle();
            assert!(!engine.is_running());
        }

        #[test]
        fn test_running_flag_is_published() {
            let (mut engine, _rx) = create_engine();
            let running = engine.subscribe_running();

            engine.start();
            assert!(*running.borrow());
            engine.pause();
            assert!(!*running.borrow());
            engine.start();
            engine.reset();
            assert!(!*running.borrow());
        }

        #[test]
        fn test_reset_from_any_state() {
            let initial = TimerSnapshot::initial(&PomodoroConfig::default());

            for (seconds, phase, running) in [
                (42, TimerPhase::Break, true),
                (0, TimerPhase::Break, false),
                (7, TimerPhase::Work, true),
                (1500, TimerPhase::Work, false),
            ] {
                let store = seeded_store(seconds, phase, running);
                let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store.clone());

                engine.reset();

                assert_eq!(engine.snapshot(), initial);
                assert_eq!(store.get(KEY_RUNNING).unwrap().as_deref(), Some("false"));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[test]
        fn test_tick_while_paused_does_nothing() {
            let (mut engine, mut rx) = create_engine();

            assert!(!engine.tick());
            assert_eq!(engine.seconds_remaining(), 1500);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_tick_decrements_and_persists() {
            let store = MemoryStore::new();
            let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store.clone());

            engine.start();
            assert!(!engine.tick());

            assert_eq!(engine.seconds_remaining(), 1499);
            assert_eq!(store.get(KEY_SECONDS_REMAINING).unwrap().as_deref(), Some("1499"));
        }

        #[test]
        fn test_work_completion_rewards_once_and_starts_break() {
            let rewards = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&rewards);
            let store = seeded_store(2, TimerPhase::Work, true);
            let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store)
                .with_reward_callback(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });

            assert!(!engine.tick());
            assert!(engine.tick());
            assert!(!engine.tick());

            assert_eq!(engine.phase(), TimerPhase::Break);
            assert_eq!(engine.seconds_remaining(), 5 * 60 - 1);
            assert!(engine.is_running());
            assert_eq!(rewards.load(Ordering::SeqCst), 1);
            assert_eq!(engine.completed_sessions(), 1);
        }

        #[test]
        fn test_break_completion_starts_work_without_reward() {
            let rewards = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&rewards);
            let store = seeded_store(1, TimerPhase::Break, true);
            let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store)
                .with_reward_callback(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });

            assert!(engine.tick());

            assert_eq!(engine.phase(), TimerPhase::Work);
            assert_eq!(engine.seconds_remaining(), 25 * 60);
            assert!(engine.is_running());
            assert_eq!(rewards.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_zero_remaining_completes_on_next_tick() {
            let store = seeded_store(0, TimerPhase::Work, true);
            let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store);

            assert!(engine.tick());
            assert_eq!(engine.phase(), TimerPhase::Break);
            assert_eq!(engine.seconds_remaining(), 300);
        }

        #[test]
        fn test_completion_events_in_order() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let store = seeded_store(1, TimerPhase::Work, true);
            let mut engine =
                PomodoroEngine::new(PomodoroConfig::default(), store).with_event_sender(tx);

            engine.tick();

            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Tick {
                    phase: TimerPhase::Work,
                    remaining_seconds: 0
                }
            );
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::WorkCompleted {
                    completed_sessions: 1
                }
            );
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_transition_is_persisted() {
            let store = seeded_store(1, TimerPhase::Work, true);
            let mut engine = PomodoroEngine::new(PomodoroConfig::default(), store.clone());

            engine.tick();

            assert_eq!(store.get(KEY_PHASE).unwrap().as_deref(), Some("BREAK"));
            assert_eq!(store.get(KEY_SECONDS_REMAINING).unwrap().as_deref(), Some("300"));
            assert_eq!(store.get(KEY_RUNNING).unwrap().as_deref(), Some("true"));
        }

        #[test]
        fn test_custom_durations() {
            let config = PomodoroConfig::default()
                .with_work_minutes(1)
                .with_break_minutes(2);
            let store = seeded_store(1, TimerPhase::Work, true);
            let mut engine = PomodoroEngine::new(config, store);

            engine.tick();
            assert_eq!(engine.seconds_remaining(), 120);
        }

        #[test]
        fn test_dropped_receiver_does_not_break_ticking() {
            let (mut engine, rx) = create_engine();
            drop(rx);

            engine.start();
            engine.tick();
            assert_eq!(engine.seconds_remaining(), 1499);
        }
    }
}
