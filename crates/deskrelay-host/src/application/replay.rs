//! ReplayEngine: turns control snapshots into the minimal input event sequence.
//!
//! A viewer does not send "key A went down" events.  It sends its whole input
//! state (pointer position, held buttons, held keys) over and over, and the
//! host works out what changed since the last state it applied.
//!
//! # Per-snapshot algorithm
//!
//! Each snapshot goes through these steps, in this order:
//!
//! 1. **Staleness**: drop it if it has no `time`, if its `time` is not newer
//!    than the last applied one, or if it is older than the freshness window.
//! 2. **Move**: denormalize the position against the driver's geometry and
//!    move once if the pixel differs from the last one applied.
//! 3. **Buttons**: every bit that went from 1 to 0 is released, then every
//!    bit that went from 0 to 1 is pressed.  Bits are independent, so holding
//!    left while pressing right is a chord, not a switch.
//! 4. **Wheel**: a non-zero wheel delta becomes one wheel event.  It is a
//!    delta, not a state, and is never re-applied.
//! 5. **Keys**: keys held before but not now are released, keys held now but
//!    not before are pressed.  A key already down is never pressed again,
//!    including when it is reported by another identifier for the same
//!    physical position (`{code:"KeyA"}` and `{keyCode:65}`).
//! 6. **Commit**: the new state and `time` become the applied state.
//!
//! A sub-part that is missing or malformed (no `mouse`, a non-numeric
//! coordinate, no `keys`) skips only its own step.
//!
//! # Plan, then dispatch (for beginners)
//!
//! [`ReplayEngine::plan`] runs steps 1 to 6 synchronously and returns the
//! command list; [`ReplayEngine::apply`] only then awaits the driver.  State
//! is therefore never half-updated across an `.await`, and a driver error
//! halfway through a snapshot cannot leave the engine believing a key is up
//! when it already sent the down.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use deskrelay_core::wake::is_within;
use deskrelay_core::keymap::KeyMapper;
use deskrelay_core::{ButtonMask, ControlSnapshot, HidKeyCode, InputCommand, KeyId, KeyIdentity};
use tracing::{debug, error, warn};

use crate::infrastructure::input_driver::{dispatch, DriverError, InputDriver};

/// Default freshness window for incoming snapshots.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5);

/// Restarts attempted after the backend dies before replay is switched off.
pub const MAX_DRIVER_RESTARTS: u32 = 3;

// ── Replay state ──────────────────────────────────────────────────────────────

/// Input state the engine believes the OS is in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayState {
    /// Held keys, keyed by their diff identity.
    pub applied_keys: BTreeMap<KeyIdentity, KeyId>,
    pub applied_buttons: ButtonMask,
    /// Last pointer position sent, in pixels.
    pub last_mouse: Option<(i32, i32)>,
    /// `time` of the last snapshot that passed the staleness filter.
    pub last_applied_time: Option<u64>,
}

/// Why a snapshot was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NoTime,
    /// `time` is not newer than the last applied snapshot.
    Duplicate,
    /// Older than the freshness window.
    Expired,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Owns the [`ReplayState`] and the driver it replays through.
pub struct ReplayEngine {
    driver: Arc<dyn InputDriver>,
    state: ReplayState,
    freshness: Duration,
    restarts: u32,
    disabled: bool,
}

impl ReplayEngine {
    pub fn new(driver: Arc<dyn InputDriver>, freshness: Duration) -> Self {
        Self {
            driver,
            state: ReplayState::default(),
            freshness,
            restarts: 0,
            disabled: false,
        }
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    /// `true` once the backend has died for good; every later apply is a no-op.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Runs steps 1 to 6 for `snapshot` and returns the commands to send.
    ///
    /// State is committed before returning.
    ///
    /// # Errors
    ///
    /// Returns the [`Skip`] reason when the snapshot is filtered out; state
    /// is untouched in that case.
    pub fn plan(&mut self, snapshot: &ControlSnapshot, now_ms: u64) -> Result<Vec<InputCommand>, Skip> {
        // 1. Staleness
        let time = snapshot.time.ok_or(Skip::NoTime)?;
        if self.state.last_applied_time.is_some_and(|last| time <= last) {
            return Err(Skip::Duplicate);
        }
        if !is_within(time, now_ms, self.freshness) {
            return Err(Skip::Expired);
        }

        let mut commands = Vec::new();

        if let Some(mouse) = &snapshot.mouse {
            // 2. Move
            let target = mouse
                .position()
                .and_then(|(x, y)| self.driver.geometry().denormalize(x, y));
            if let Some((x, y)) = target {
                if self.state.last_mouse != Some((x, y)) {
                    commands.push(InputCommand::Move { x, y });
                    self.state.last_mouse = Some((x, y));
                }
            }

            // 3. Buttons
            if let Some(next) = mouse.buttons {
                let current = self.state.applied_buttons;
                commands.extend(current.released_in(next).map(InputCommand::ButtonUp));
                commands.extend(current.pressed_in(next).map(InputCommand::ButtonDown));
                self.state.applied_buttons = next;
            }

            // 4. Wheel
            let steps = mouse.wheel_steps();
            if steps != 0 {
                commands.push(InputCommand::Wheel(steps));
            }
        }

        // 5. Keys
        if let Some(keys) = &snapshot.keys {
            let applied_at: BTreeMap<HidKeyCode, (&KeyIdentity, &KeyId)> = self
                .state
                .applied_keys
                .iter()
                .filter_map(|(identity, key)| KeyMapper::position(key).map(|hid| (hid, (identity, key))))
                .collect();
            let mut held: BTreeMap<KeyIdentity, KeyId> = BTreeMap::new();
            let mut positions = BTreeSet::new();
            let mut pressed = Vec::new();
            for key in keys {
                let Some(identity) = key.identity() else { continue };
                let position = KeyMapper::position(key);
                if held.contains_key(&identity) || position.is_some_and(|hid| !positions.insert(hid)) {
                    continue;
                }
                if !self.state.applied_keys.contains_key(&identity) {
                    // Same physical key already down under another identity.
                    if let Some((previous, down)) = position.and_then(|hid| applied_at.get(&hid)) {
                        held.insert((*previous).clone(), (*down).clone());
                        continue;
                    }
                    pressed.push(key.clone());
                }
                held.insert(identity, key.clone());
            }
            commands.extend(
                self.state
                    .applied_keys
                    .iter()
                    .filter(|(identity, _)| !held.contains_key(*identity))
                    .map(|(_, key)| InputCommand::KeyUp(key.clone())),
            );
            commands.extend(pressed.into_iter().map(InputCommand::KeyDown));
            self.state.applied_keys = held;
        }

        // 6. Commit
        self.state.last_applied_time = Some(time);
        Ok(commands)
    }

    /// Plans `snapshot` and sends the result through the driver.
    ///
    /// Returns the number of commands sent; `0` for a skipped snapshot or a
    /// disabled engine.
    ///
    /// # Errors
    ///
    /// [`DriverError::SubprocessExited`] when the backend died and could not
    /// be restarted; the engine is disabled from then on.  Other per-command
    /// failures are logged and the rest of the plan still goes out.
    pub async fn apply(&mut self, snapshot: &ControlSnapshot, now_ms: u64) -> Result<usize, DriverError> {
        if self.disabled {
            return Ok(0);
        }
        match self.plan(snapshot, now_ms) {
            Ok(commands) => self.send_all(&commands).await,
            Err(skip) => {
                debug!(time = ?snapshot.time, reason = ?skip, "snapshot skipped");
                Ok(0)
            }
        }
    }

    /// Applies one poll's worth of snapshots in ascending `time` order.
    ///
    /// # Errors
    ///
    /// Stops at the first [`DriverError::SubprocessExited`] that could not be
    /// recovered.
    pub async fn apply_batch(&mut self, mut snapshots: Vec<ControlSnapshot>, now_ms: u64) -> Result<usize, DriverError> {
        snapshots.sort_by_key(|s| s.time);
        let mut sent = 0;
        for snapshot in &snapshots {
            sent += self.apply(snapshot, now_ms).await?;
        }
        Ok(sent)
    }

    /// Releases every held key and button.
    ///
    /// Used on shutdown so nothing stays stuck down on the host.
    pub async fn release_all(&mut self) -> Result<usize, DriverError> {
        if self.disabled {
            return Ok(0);
        }
        let held = std::mem::take(&mut self.state.applied_keys);
        let buttons = std::mem::replace(&mut self.state.applied_buttons, ButtonMask::NONE);
        let mut commands: Vec<InputCommand> = held.into_values().map(InputCommand::KeyUp).collect();
        commands.extend(buttons.released_in(ButtonMask::NONE).map(InputCommand::ButtonUp));
        self.send_all(&commands).await
    }

    async fn send_all(&mut self, commands: &[InputCommand]) -> Result<usize, DriverError> {
        let mut sent = 0;
        for command in commands {
            match self.send_one(command).await {
                Ok(()) => sent += 1,
                Err(DriverError::SubprocessExited) => return Err(DriverError::SubprocessExited),
                Err(e) => warn!(backend = self.driver.name(), command = command.kind(), "input command failed: {e}"),
            }
        }
        Ok(sent)
    }

    /// Sends one command; a dead backend is restarted and the command retried
    /// once, up to [`MAX_DRIVER_RESTARTS`] times per engine.
    async fn send_one(&mut self, command: &InputCommand) -> Result<(), DriverError> {
        debug!(command = command.kind(), "dispatch");
        match dispatch(self.driver.as_ref(), command).await {
            Err(DriverError::SubprocessExited) => {}
            other => return other,
        }

        while self.restarts < MAX_DRIVER_RESTARTS {
            self.restarts += 1;
            warn!(
                backend = self.driver.name(),
                attempt = self.restarts,
                "input backend exited; restarting"
            );
            match self.driver.restart().await {
                Ok(()) => match dispatch(self.driver.as_ref(), command).await {
                    Err(DriverError::SubprocessExited) => continue,
                    other => return other,
                },
                Err(e) => warn!(backend = self.driver.name(), "restart failed: {e}"),
            }
        }

        self.disabled = true;
        error!(
            backend = self.driver.name(),
            "input backend keeps exiting; input replay disabled"
        );
        Err(DriverError::SubprocessExited)
    }
}
