//! Component integration tests.
//!
//! These tests verify that the public components work together:
//! - PlaybackController + MockAudioBackend + CustomTrack files
//! - PomodoroEngine + Ticker + event channel + reward callback
//! - Session wiring of timer events to ambient sound

use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use focusnoise::cli::{Session, SessionCommand};
use focusnoise::sound::{MockAudioBackend, PlaybackController, SoundError, SourceType};
use focusnoise::store::MemoryStore;
use focusnoise::timer::{PomodoroEngine, Ticker, TimerEvent};
use focusnoise::types::{PomodoroConfig, TimerPhase};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a controller with small noise buffers and an inspection handle.
fn create_controller() -> (PlaybackController<MockAudioBackend>, MockAudioBackend) {
    let backend = MockAudioBackend::new();
    let inspector = backend.clone();
    let controller = PlaybackController::new(backend)
        .with_sample_rate(8_000)
        .with_buffer_seconds(0.05);
    (controller, inspector)
}

/// Creates a fast configuration for quick tests (1-minute intervals).
fn create_fast_config() -> PomodoroConfig {
    PomodoroConfig::default()
        .with_work_minutes(1)
        .with_break_minutes(1)
}

/// Collects all events currently queued.
fn collect_events(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Playback
// ============================================================================

/// 音源を何度切り替えても同時に鳴るボイスは1つまでであること
#[test]
fn test_rapid_switching_keeps_single_voice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loop.ogg");
    fs::write(&path, b"OggS-loop").unwrap();
    let (mut controller, backend) = create_controller();

    controller.load_custom_track(&path).unwrap();
    let sources = [SourceType::White, SourceType::Pink, SourceType::Custom];
    for i in 0..10 {
        controller.set_source_type(sources[i % sources.len()]).unwrap();
        assert!(backend.active_voices() <= 1);
    }
    controller.pause();

    assert_eq!(backend.active_voices(), 0);
    assert_eq!(backend.peak_active_voices(), 1);
    assert!(!controller.is_playing());
}

/// 再生中の音量変更でボイスが作り直されないこと
#[test]
fn test_volume_change_keeps_voice() {
    let (mut controller, backend) = create_controller();
    controller.set_source_type(SourceType::Pink).unwrap();
    controller.play().unwrap();

    for step in 0..=10 {
        controller.set_volume(step as f32 / 10.0);
    }

    assert_eq!(backend.start_count(), 1);
    assert_eq!(backend.stop_count(), 0);
    assert_eq!(backend.volume_changes().len(), 11);
    assert!(controller.is_playing());
}

/// オーディオが許可されていない場合は再生状態にならないこと
#[test]
fn test_blocked_output_reports_error() {
    let (mut controller, backend) = create_controller();
    backend.set_blocked(true);

    let err = controller.play().unwrap_err();

    assert!(err.is_device_error());
    assert!(!controller.is_playing());
    assert_eq!(backend.active_voices(), 0);
}

/// カスタム音源が未設定のまま再生するとエラーになり、読み込み後に再生されること
#[test]
fn test_custom_source_waits_for_track() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rain.mp3");
    fs::write(&path, b"ID3-rain").unwrap();
    let (mut controller, backend) = create_controller();
    controller.set_source_type(SourceType::Custom).unwrap();

    assert!(matches!(controller.play(), Err(SoundError::NoSourceConfigured)));
    assert!(!controller.is_playing());

    controller.load_custom_track(&path).unwrap();

    assert!(controller.is_playing());
    assert_eq!(backend.started().len(), 1);
    assert_eq!(backend.started()[0].source, "custom:rain.mp3");
}

/// 上限を超えるファイルは読み込まれないこと
#[test]
fn test_oversized_track_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.wav");
    fs::write(&path, vec![0u8; 4096]).unwrap();
    let (controller, backend) = create_controller();
    let mut controller = controller.with_max_track_bytes(1024);

    let err = controller.load_custom_track(&path).unwrap_err();

    assert!(matches!(err, SoundError::TrackTooLarge { size: 4096, limit: 1024 }));
    assert!(controller.config().custom_track.is_none());
    assert_eq!(backend.start_count(), 0);
}

/// 破棄時にボイスと出力が解放されること
#[test]
fn test_drop_releases_audio() {
    let (mut controller, backend) = create_controller();
    controller.play().unwrap();
    assert_eq!(backend.active_voices(), 1);

    drop(controller);

    assert_eq!(backend.active_voices(), 0);
    assert_eq!(backend.release_count(), 1);
}

// ============================================================================
// Timer
// ============================================================================

/// ティックループのイベントが順に届くこと
#[tokio::test(start_paused = true)]
async fn test_tick_loop_event_sequence() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rewards = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&rewards);
    let engine = PomodoroEngine::new(create_fast_config(), MemoryStore::new())
        .with_event_sender(tx)
        .with_reward_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let (shared, _ticker) = Ticker::start(engine);

    shared.lock().await.start();
    tokio::time::sleep(Duration::from_millis(60_500)).await;

    let events = collect_events(&mut rx);
    assert_eq!(
        events.first(),
        Some(&TimerEvent::Started {
            phase: TimerPhase::Work,
            remaining_seconds: 60
        })
    );
    let ticks = events
        .iter()
        .filter(|e| matches!(e, TimerEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 60);
    assert!(events.contains(&TimerEvent::WorkCompleted {
        completed_sessions: 1
    }));
    assert_eq!(rewards.load(Ordering::SeqCst), 1);

    let engine = shared.lock().await;
    assert_eq!(engine.phase(), TimerPhase::Break);
    assert_eq!(engine.seconds_remaining(), 60);
    assert!(engine.is_running());
}

/// 一時停止中は時間が進まないこと
#[tokio::test(start_paused = true)]
async fn test_paused_timer_does_not_advance() {
    let engine = PomodoroEngine::new(PomodoroConfig::default(), MemoryStore::new());
    let (shared, _ticker) = Ticker::start(engine);

    shared.lock().await.start();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    shared.lock().await.pause();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(shared.lock().await.seconds_remaining(), 25 * 60 - 10);
}

// ============================================================================
// Session
// ============================================================================

/// 作業中だけサウンドが鳴ること
#[tokio::test(start_paused = true)]
async fn test_session_follows_timer() {
    let (controller, backend) = create_controller();
    let (mut session, mut events) =
        Session::start(create_fast_config(), MemoryStore::new(), Some(controller), true);

    session.sync_sound().await;
    assert_eq!(backend.active_voices(), 0);

    session.handle_command(SessionCommand::ToggleTimer).await;
    for event in collect_events(&mut events) {
        session.handle_event(event).await;
    }
    assert_eq!(backend.active_voices(), 1);

    tokio::time::sleep(Duration::from_millis(60_500)).await;
    for event in collect_events(&mut events) {
        session.handle_event(event).await;
    }
    assert_eq!(backend.active_voices(), 0);
    assert_eq!(session.points(), 2);

    session.handle_command(SessionCommand::Reset).await;
    session.handle_command(SessionCommand::ToggleTimer).await;
    for event in collect_events(&mut events) {
        session.handle_event(event).await;
    }
    assert_eq!(backend.active_voices(), 1);
    assert_eq!(backend.peak_active_voices(), 1);
}
