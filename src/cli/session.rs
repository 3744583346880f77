//! Interactive focus session.
//!
//! Wires a [`PomodoroEngine`] and a [`PlaybackController`] to line commands
//! read from stdin. The two never talk to each other directly; the session
//! reacts to timer events and decides whether sound should play.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::commands::RunArgs;
use super::display::Display;
use crate::config::Settings;
use crate::sound::{
    AudioBackend, CustomTrack, PlaybackController, RodioBackend, SoundError, SourceType,
};
use crate::store::{JsonFileStore, KeyValueStore};
use crate::timer::{PomodoroEngine, SharedEngine, Ticker, TimerEvent};
use crate::types::{PomodoroConfig, TimerPhase, TimerSnapshot};

/// Points granted for each completed work interval.
pub const REWARD_POINTS: u32 = 2;

/// Volume change per `+` / `-` command.
pub const VOLUME_STEP: f32 = 0.1;

// ============================================================================
// SessionCommand
// ============================================================================

/// A line command typed during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Start or pause the timer
    ToggleTimer,
    /// Reset the timer to a fresh work interval
    Reset,
    /// Select a sound
    Source(SourceType),
    /// Raise the volume one step
    VolumeUp,
    /// Lower the volume one step
    VolumeDown,
    /// Turn sound on or off
    ToggleSound,
    /// Load an audio file as the custom sound
    Load(PathBuf),
    /// Show the timer and sound state
    Status,
    /// Show the key help
    Help,
    /// End the session
    Quit,
}

impl SessionCommand {
    /// Parses one input line. Returns `None` for unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if let Some(path) = line.strip_prefix("l ") {
            let path = path.trim();
            return (!path.is_empty()).then(|| Self::Load(PathBuf::from(path)));
        }

        match line {
            "s" => Some(Self::ToggleTimer),
            "r" => Some(Self::Reset),
            "w" => Some(Self::Source(SourceType::White)),
            "p" => Some(Self::Source(SourceType::Pink)),
            "c" => Some(Self::Source(SourceType::Custom)),
            "+" => Some(Self::VolumeUp),
            "-" => Some(Self::VolumeDown),
            "m" => Some(Self::ToggleSound),
            "" => Some(Self::Status),
            "h" | "?" => Some(Self::Help),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A running engine with its tick loop and optional ambient sound.
pub struct Session<B: AudioBackend> {
    engine: SharedEngine,
    _ticker: Ticker,
    controller: Option<PlaybackController<B>>,
    follow_timer: bool,
    sound_enabled: bool,
    points: Arc<AtomicU32>,
}

impl<B: AudioBackend> Session<B> {
    /// Builds the engine, spawns its tick loop, and returns the session with
    /// the receiver of its timer events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: PomodoroConfig,
        store: impl KeyValueStore + Send + 'static,
        controller: Option<PlaybackController<B>>,
        follow_timer: bool,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let points = Arc::new(AtomicU32::new(0));

        let reward_points = Arc::clone(&points);
        let engine = PomodoroEngine::new(config, store)
            .with_reward_callback(move || {
                let total =
                    reward_points.fetch_add(REWARD_POINTS, Ordering::Relaxed) + REWARD_POINTS;
                info!("Work interval rewarded, {} points this session", total);
            })
            .with_event_sender(event_tx);

        let (engine, ticker) = Ticker::start(engine);

        let session = Self {
            engine,
            _ticker: ticker,
            controller,
            follow_timer,
            sound_enabled: true,
            points,
        };
        (session, event_rx)
    }

    /// Applies a command. Returns false when the session should end.
    pub async fn handle_command(&mut self, command: SessionCommand) -> bool {
        debug!("Session command: {:?}", command);

        match command {
            SessionCommand::ToggleTimer => self.engine.lock().await.toggle(),
            SessionCommand::Reset => self.engine.lock().await.reset(),
            SessionCommand::Status => {
                self.show_timer().await;
                self.show_sound();
            }
            SessionCommand::Help => Display::show_session_help(self.controller.is_some()),
            SessionCommand::Quit => return false,
            SessionCommand::Source(source) => {
                if let Some(controller) = self.controller.as_mut() {
                    if let Err(e) = controller.set_source_type(source) {
                        self.report_sound_error(&e);
                    }
                }
                self.sync_sound().await;
                self.show_sound();
            }
            SessionCommand::VolumeUp => self.change_volume(VOLUME_STEP),
            SessionCommand::VolumeDown => self.change_volume(-VOLUME_STEP),
            SessionCommand::ToggleSound => {
                self.sound_enabled = !self.sound_enabled;
                self.sync_sound().await;
                self.show_sound();
            }
            SessionCommand::Load(path) => {
                self.load_track(&path).await;
                self.show_sound();
            }
        }
        true
    }

    /// Reacts to a timer event.
    pub async fn handle_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Started { .. } | TimerEvent::Paused { .. } | TimerEvent::Reset => {
                self.show_timer().await;
                self.sync_sound().await;
            }
            TimerEvent::Tick {
                remaining_seconds, ..
            } => {
                if remaining_seconds % 60 == 0 {
                    self.show_timer().await;
                }
            }
            TimerEvent::WorkCompleted { completed_sessions } => {
                Display::show_work_completed(completed_sessions, REWARD_POINTS);
                self.sync_sound().await;
            }
            TimerEvent::BreakCompleted => {
                Display::show_break_completed();
                self.sync_sound().await;
            }
        }
    }

    /// Starts or stops sound to match the timer and the sound toggle.
    pub async fn sync_sound(&mut self) {
        let snapshot = self.snapshot().await;
        let wanted = self.sound_wanted(&snapshot);

        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        if wanted && !controller.wants_playback() {
            if let Err(e) = controller.play() {
                self.report_sound_error(&e);
            }
        } else if !wanted && controller.wants_playback() {
            controller.pause();
        }
    }

    /// Returns true if sound is switched on for this session.
    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Stops sound and prints the session summary.
    pub async fn finish(&mut self) {
        if let Some(controller) = self.controller.as_mut() {
            controller.shutdown();
        }
        let completed = self.engine.lock().await.completed_sessions();
        Display::show_session_summary(completed, self.points());
    }

    /// Returns the points earned in this session.
    #[must_use]
    pub fn points(&self) -> u32 {
        self.points.load(Ordering::Relaxed)
    }

    /// Returns the shared engine.
    #[must_use]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    async fn snapshot(&self) -> TimerSnapshot {
        self.engine.lock().await.snapshot()
    }

    fn sound_wanted(&self, snapshot: &TimerSnapshot) -> bool {
        self.sound_enabled
            && (!self.follow_timer || (snapshot.running && snapshot.phase == TimerPhase::Work))
    }

    fn change_volume(&mut self, step: f32) {
        if let Some(controller) = self.controller.as_mut() {
            controller.set_volume(controller.volume() + step);
        }
        self.show_sound();
    }

    async fn load_track(&mut self, path: &Path) {
        let Some(controller) = self.controller.as_mut() else {
            Display::show_sound_disabled();
            return;
        };

        match controller.load_custom_track(path) {
            Ok(()) => self.sound_enabled = true,
            Err(e) => self.report_sound_error(&e),
        }
        self.sync_sound().await;
    }

    /// Shows a sound error. Errors that retrying cannot fix turn sound off so
    /// later timer events do not repeat them.
    fn report_sound_error(&mut self, error: &SoundError) {
        Display::show_sound_error(error);
        if !error.is_recoverable() {
            self.sound_enabled = false;
        }
    }

    async fn show_timer(&self) {
        Display::show_timer(&self.snapshot().await);
    }

    fn show_sound(&self) {
        match &self.controller {
            Some(controller) => Display::show_sound(
                controller.source_type(),
                controller.volume(),
                controller.is_playing(),
            ),
            None => Display::show_sound_disabled(),
        }
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Runs an interactive session until `q`, end of input, or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub async fn run(settings: &Settings, args: &RunArgs) -> Result<()> {
    let state_path = settings.state_path();
    let store = JsonFileStore::open(&state_path)
        .with_context(|| format!("状態ファイルを開けません: {}", state_path.display()))?;

    let controller = if args.no_sound {
        None
    } else {
        Some(build_controller(settings, args.track.as_deref()))
    };

    let (mut session, mut events) = Session::start(
        settings.timer.clone(),
        store,
        controller,
        settings.sound.follow_timer,
    );

    Display::show_session_help(!args.no_sound);
    session.handle_command(SessionCommand::Status).await;
    session.sync_sound().await;

    let mut input = spawn_input_reader();
    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    break;
                };
                match SessionCommand::parse(&line) {
                    Some(command) => {
                        if !session.handle_command(command).await {
                            break;
                        }
                    }
                    None => Display::show_unknown_command(&line),
                }
            }
            Some(event) = events.recv() => {
                session.handle_event(event).await;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    session.finish().await;
    Ok(())
}

/// Reads stdin lines on a dedicated thread.
///
/// A blocking read cannot be cancelled, so it must not live on the runtime
/// or shutdown would wait for the next line. The channel closes at end of
/// input.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn build_controller(settings: &Settings, track: Option<&Path>) -> PlaybackController<RodioBackend> {
    let sound = &settings.sound;
    let mut controller = PlaybackController::new(RodioBackend::new())
        .with_sample_rate(sound.sample_rate)
        .with_buffer_seconds(sound.buffer_seconds)
        .with_max_track_bytes(sound.max_track_bytes());
    controller.set_volume(sound.volume);

    if let Some(path) = track {
        let result = CustomTrack::from_path(path, sound.max_track_bytes())
            .and_then(|track| controller.set_custom_track(track));
        if let Err(e) = result {
            Display::show_sound_error(&e);
        }
    }

    // Nothing is playing yet, so selecting cannot fail.
    if let Err(e) = controller.set_source_type(sound.source) {
        Display::show_sound_error(&e);
    }
    controller
}
