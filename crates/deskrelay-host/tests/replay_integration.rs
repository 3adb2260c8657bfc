//! Integration tests for snapshot replay and the wake protocol.
//!
//! Everything runs against `MockInputDriver`, so these check exactly which
//! input events reach the OS layer:
//! - Replaying converged state is a no-op
//! - Duplicate or stale snapshots issue nothing
//! - No key is ever pressed twice without a release in between
//! - Wheel and pointer clamping
//! - 30 s without controls puts the host to sleep and stops capture

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use deskrelay_core::{ButtonMask, ControlSnapshot, InputCommand, KeyId, MouseButton, MouseState, Wheel};
use deskrelay_host::application::host_loop::{CaptureLoop, CaptureOutcome, FrameSource, PollLoop, RelayApi};
use deskrelay_host::application::replay::{ReplayEngine, DEFAULT_FRESHNESS};
use deskrelay_host::application::wake::{WakeMonitor, WakeState};
use deskrelay_host::infrastructure::capture::CaptureError;
use deskrelay_host::infrastructure::input_driver::mock::MockInputDriver;
use deskrelay_host::infrastructure::input_driver::InputDriver;
use deskrelay_host::infrastructure::relay_client::RelayClientError;

const NOW: u64 = 1_700_000_000_000;

fn engine(driver: &Arc<MockInputDriver>) -> ReplayEngine {
    ReplayEngine::new(Arc::clone(driver) as Arc<dyn InputDriver>, DEFAULT_FRESHNESS)
}

fn snapshot(time: u64, mouse: Option<MouseState>, keys: &[&str]) -> ControlSnapshot {
    ControlSnapshot {
        mouse,
        keys: Some(keys.iter().map(|c| KeyId::from_code(*c)).collect()),
        time: Some(time),
        ..ControlSnapshot::default()
    }
}

fn wheel(time: u64, y: i32) -> ControlSnapshot {
    ControlSnapshot {
        mouse: Some(MouseState {
            wheel: Some(Wheel { y }),
            ..MouseState::default()
        }),
        time: Some(time),
        ..ControlSnapshot::default()
    }
}

// ── Convergence ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_replaying_converged_state_issues_nothing() {
    // Arrange
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);
    let state = Some(MouseState::at(0.25, 0.75, 0b011));
    engine
        .apply(&snapshot(NOW - 20, state, &["ControlLeft", "KeyC"]), NOW)
        .await
        .unwrap();
    let applied = engine.state().clone();
    driver.clear();

    // Act: same content, newer stamp
    let sent = engine
        .apply(&snapshot(NOW - 10, state, &["ControlLeft", "KeyC"]), NOW)
        .await
        .unwrap();

    // Assert
    assert_eq!(sent, 0);
    assert!(driver.commands().is_empty());
    assert_eq!(engine.state().applied_keys, applied.applied_keys);
    assert_eq!(engine.state().applied_buttons, applied.applied_buttons);
    assert_eq!(engine.state().last_mouse, applied.last_mouse);
    assert_eq!(engine.state().last_applied_time, Some(NOW - 10));
}

#[tokio::test]
async fn test_duplicate_time_issues_zero_events() {
    // Arrange
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);
    let first = snapshot(NOW - 10, Some(MouseState::at(0.5, 0.5, 1)), &["KeyA"]);
    engine.apply(&first, NOW).await.unwrap();
    driver.clear();

    // Act: a different state carrying the same stamp
    let replay = snapshot(NOW - 10, Some(MouseState::at(0.1, 0.1, 0)), &[]);
    let sent = engine.apply(&replay, NOW).await.unwrap();

    // Assert
    assert_eq!(sent, 0);
    assert!(driver.commands().is_empty());
}

#[tokio::test]
async fn test_snapshot_older_than_freshness_window_is_dropped() {
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);

    let sent = engine.apply(&snapshot(NOW - 5_001, None, &["KeyA"]), NOW).await.unwrap();

    assert_eq!(sent, 0);
    assert!(driver.commands().is_empty());
}

// ── Keys ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_no_double_key_down_over_long_sequence() {
    // Arrange: a deterministic pseudo-random walk over a small key set
    const CODES: [&str; 6] = ["KeyA", "KeyB", "ShiftLeft", "ControlLeft", "Digit1", "Space"];
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);
    let mut seed: u32 = 0x2545_F491;
    let mut batch = Vec::new();
    for i in 0..200u64 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let held: Vec<&str> = CODES
            .iter()
            .enumerate()
            .filter(|(bit, _)| (seed >> (8 + bit)) & 1 == 1)
            .map(|(_, code)| *code)
            .collect();
        batch.push(snapshot(NOW - 1_000 + i, None, &held));
    }

    // Act
    engine.apply_batch(batch, NOW).await.unwrap();
    engine.release_all().await.unwrap();

    // Assert: every down pairs with a later up, never two downs in a row
    let mut down = BTreeSet::new();
    for command in driver.commands() {
        match command {
            InputCommand::KeyDown(key) => {
                assert!(down.insert(key.code.clone()), "second key-down for {key:?}");
            }
            InputCommand::KeyUp(key) => {
                assert!(down.remove(&key.code), "key-up for {key:?} which was not down");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
    assert!(down.is_empty(), "keys left held after release_all: {down:?}");
}

#[tokio::test]
async fn test_keys_absent_from_snapshot_leave_held_keys_alone() {
    // Arrange
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);
    engine.apply(&snapshot(NOW - 20, None, &["ShiftLeft"]), NOW).await.unwrap();
    driver.clear();

    // Act: a mouse-only snapshot
    let mouse_only = ControlSnapshot {
        mouse: Some(MouseState::at(0.5, 0.5, 0)),
        time: Some(NOW - 10),
        ..ControlSnapshot::default()
    };
    engine.apply(&mouse_only, NOW).await.unwrap();

    // Assert
    assert_eq!(driver.commands(), vec![InputCommand::Move { x: 960, y: 540 }]);
    assert_eq!(engine.state().applied_keys.len(), 1);
}

// ── Wheel & pointer ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_wheel_is_clamped_and_zero_is_ignored() {
    // Arrange
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);

    // Act
    engine
        .apply_batch(vec![wheel(NOW - 30, 57), wheel(NOW - 20, 0), wheel(NOW - 10, -300)], NOW)
        .await
        .unwrap();

    // Assert
    assert_eq!(driver.commands(), vec![InputCommand::Wheel(20), InputCommand::Wheel(-20)]);
}

#[tokio::test]
async fn test_pointer_outside_viewport_is_clamped_to_screen_edge() {
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);

    engine
        .apply(&snapshot(NOW - 10, Some(MouseState::at(1.5, -0.2, 0)), &[]), NOW)
        .await
        .unwrap();

    assert_eq!(driver.commands(), vec![InputCommand::Move { x: 1919, y: 0 }]);
}

#[tokio::test]
async fn test_neutral_snapshot_releases_everything() {
    // Arrange
    let driver = Arc::new(MockInputDriver::new());
    let mut engine = engine(&driver);
    engine
        .apply(&snapshot(NOW - 20, Some(MouseState::at(0.5, 0.5, 0b001)), &["KeyW"]), NOW)
        .await
        .unwrap();
    driver.clear();
    let mut neutral = ControlSnapshot::neutral();
    neutral.time = Some(NOW - 10);

    // Act
    engine.apply(&neutral, NOW).await.unwrap();

    // Assert
    assert_eq!(
        driver.commands(),
        vec![
            InputCommand::ButtonUp(MouseButton::Left),
            InputCommand::KeyUp(KeyId::from_code("KeyW")),
        ]
    );
    assert_eq!(engine.state().applied_buttons, ButtonMask::NONE);
}

// ── Wake protocol ─────────────────────────────────────────────────────────────

struct ScriptedRelay {
    controls: Vec<ControlSnapshot>,
    uploads: AtomicUsize,
}

#[async_trait]
impl RelayApi for ScriptedRelay {
    async fn post_image(&self, _image: Bytes) -> Result<(), RelayClientError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_controls(&self, since: Option<u64>) -> Result<Vec<ControlSnapshot>, RelayClientError> {
        Ok(self
            .controls
            .iter()
            .filter(|s| since.map_or(true, |since| s.time.unwrap_or(0) > since))
            .cloned()
            .collect())
    }
}

struct OnePixel;

#[async_trait]
impl FrameSource for OnePixel {
    async fn capture(&self) -> Result<Bytes, CaptureError> {
        Ok(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
    }
}

#[tokio::test]
async fn test_thirty_seconds_without_controls_suppresses_capture() {
    // Arrange: one heartbeat at NOW
    let mut heartbeat = ControlSnapshot::heartbeat(1);
    heartbeat.time = Some(NOW);
    let relay = Arc::new(ScriptedRelay {
        controls: vec![heartbeat],
        uploads: AtomicUsize::new(0),
    });
    let wake = WakeMonitor::new(Arc::new(AtomicBool::new(false)));
    let mut capture = CaptureLoop::new(Arc::new(OnePixel), None, relay.clone(), wake.flag());
    let mut poll = PollLoop::new(relay.clone(), None, wake);

    // Act / Assert: awake right after the heartbeat
    assert_eq!(poll.tick(NOW + 100).await.wake, WakeState::Awake);
    assert!(matches!(capture.tick().await, CaptureOutcome::Uploaded { .. }));

    // Act / Assert: asleep once the heartbeat is more than 30 s old
    assert_eq!(poll.tick(NOW + 30_001).await.wake, WakeState::Asleep);
    assert_eq!(capture.tick().await, CaptureOutcome::Asleep);
    assert_eq!(relay.uploads.load(Ordering::SeqCst), 1);
}
