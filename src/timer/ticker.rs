//! One-second tick loop for [`PomodoroEngine`].
//!
//! The loop is a task on the caller's tokio runtime, not a thread. It sleeps
//! on the engine's `running` flag while paused and restarts its interval on
//! every start, so the first decrement lands a full second after `start()`.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use super::engine::PomodoroEngine;

/// Period of the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// An engine shared between the tick loop and its controller.
pub type SharedEngine = Arc<Mutex<PomodoroEngine>>;

/// Handle to a running tick loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Wraps `engine` for sharing and spawns its tick loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(engine: PomodoroEngine) -> (SharedEngine, Self) {
        let running = engine.subscribe_running();
        let shared = Arc::new(Mutex::new(engine));
        let ticker = Self::spawn(Arc::clone(&shared), running);
        (shared, ticker)
    }

    /// Spawns a tick loop for an already shared engine.
    ///
    /// `running` must come from the same engine's
    /// [`subscribe_running`](PomodoroEngine::subscribe_running).
    pub fn spawn(engine: SharedEngine, running: watch::Receiver<bool>) -> Self {
        let handle = tokio::spawn(run(engine, running));
        Self { handle }
    }

    /// Stops the loop immediately.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Returns true once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(engine: SharedEngine, mut running: watch::Receiver<bool>) {
    loop {
        if running.wait_for(|running| *running).await.is_err() {
            return;
        }

        // Missed ticks are replayed so a stalled runtime does not fall
        // behind the wall clock.
        let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        debug!("Tick loop active");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    engine.lock().await.tick();
                }
                changed = running.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !*running.borrow_and_update() {
                        debug!("Tick loop suspended");
                        break;
                    }
                }
            }
        }
    }
}
