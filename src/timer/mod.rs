//! Focus timer module.
//!
//! - `engine`: WORK/BREAK state machine with persisted countdown
//! - `ticker`: tokio task that advances the engine once per second

pub mod engine;
pub mod ticker;

pub use engine::{PomodoroEngine, RewardCallback, TimerEvent};
pub use ticker::{SharedEngine, Ticker, TICK_INTERVAL};
