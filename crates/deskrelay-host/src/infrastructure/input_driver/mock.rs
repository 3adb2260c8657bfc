//! Mock input driver for tests.
//!
//! # Why a mock driver?
//!
//! The real drivers spawn `xdotool` or PowerShell and really move the
//! pointer.  That needs a desktop session, disturbs the machine running the
//! tests, and leaves nothing to assert on.
//!
//! `MockInputDriver` records each command into a `Mutex<Vec<...>>` instead,
//! so tests can check exactly what the replay engine sent and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let driver = Arc::new(MockInputDriver::new());
//! let mut engine = ReplayEngine::new(driver.clone(), Duration::from_secs(5));
//!
//! engine.apply(&snapshot, now).await?;
//!
//! assert_eq!(driver.commands(), vec![InputCommand::Move { x: 960, y: 540 }]);
//! ```
//!
//! # Failure switches
//!
//! - `should_fail`: every call returns [`DriverError::Mock`].
//! - [`MockInputDriver::kill`]: every call returns
//!   [`DriverError::SubprocessExited`] until [`InputDriver::restart`] runs,
//!   which succeeds only when `restartable` is set.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use deskrelay_core::{InputCommand, KeyId, MouseButton, ScreenGeometry};

use super::{DriverError, InputDriver};

/// A driver that records every command without touching the OS.
pub struct MockInputDriver {
    /// Reported display size.
    pub geometry: ScreenGeometry,
    /// Every command received, in order.
    pub recorded: Mutex<Vec<InputCommand>>,
    /// When `true`, every method returns [`DriverError::Mock`].
    pub should_fail: bool,
    /// Whether [`InputDriver::restart`] revives a killed driver.
    pub restartable: bool,
    exited: AtomicBool,
    restarts: AtomicUsize,
}

impl MockInputDriver {
    /// A 1920x1080 driver that accepts everything.
    pub fn new() -> Self {
        Self::with_geometry(ScreenGeometry {
            width: 1920,
            height: 1080,
        })
    }

    pub fn with_geometry(geometry: ScreenGeometry) -> Self {
        Self {
            geometry,
            recorded: Mutex::new(Vec::new()),
            should_fail: false,
            restartable: true,
            exited: AtomicBool::new(false),
            restarts: AtomicUsize::new(0),
        }
    }

    /// A driver whose every call fails with [`DriverError::Mock`].
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Makes [`InputDriver::restart`] fail after [`MockInputDriver::kill`].
    pub fn without_restart(mut self) -> Self {
        self.restartable = false;
        self
    }

    /// Copy of every command recorded so far.
    pub fn commands(&self) -> Vec<InputCommand> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops everything recorded so far.
    pub fn clear(&self) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Simulates the backend process dying.
    pub fn kill(&self) {
        self.exited.store(true, Ordering::SeqCst);
    }

    /// Number of successful restarts.
    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    fn record(&self, command: InputCommand) -> Result<(), DriverError> {
        if self.should_fail {
            return Err(DriverError::Mock);
        }
        if self.exited.load(Ordering::SeqCst) {
            return Err(DriverError::SubprocessExited);
        }
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        Ok(())
    }
}

impl Default for MockInputDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputDriver for MockInputDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.record(InputCommand::Move { x, y })
    }

    async fn button_down(&self, button: MouseButton) -> Result<(), DriverError> {
        self.record(InputCommand::ButtonDown(button))
    }

    async fn button_up(&self, button: MouseButton) -> Result<(), DriverError> {
        self.record(InputCommand::ButtonUp(button))
    }

    async fn wheel(&self, steps: i32) -> Result<(), DriverError> {
        self.record(InputCommand::Wheel(steps))
    }

    async fn key_down(&self, key: &KeyId) -> Result<(), DriverError> {
        self.record(InputCommand::KeyDown(key.clone()))
    }

    async fn key_up(&self, key: &KeyId) -> Result<(), DriverError> {
        self.record(InputCommand::KeyUp(key.clone()))
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.record(InputCommand::TypeText(text.to_owned()))
    }

    async fn restart(&self) -> Result<(), DriverError> {
        if !self.restartable {
            return Err(DriverError::SubprocessExited);
        }
        self.exited.store(false, Ordering::SeqCst);
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_call_order() {
        // Arrange
        let driver = MockInputDriver::new();

        // Act
        driver.move_to(5, 6).await.unwrap();
        driver.button_down(MouseButton::Right).await.unwrap();

        // Assert
        assert_eq!(
            driver.commands(),
            vec![
                InputCommand::Move { x: 5, y: 6 },
                InputCommand::ButtonDown(MouseButton::Right)
            ]
        );
    }

    #[tokio::test]
    async fn test_should_fail_records_nothing() {
        let driver = MockInputDriver::failing();
        assert!(matches!(driver.wheel(1).await, Err(DriverError::Mock)));
        assert!(driver.commands().is_empty());
    }

    #[tokio::test]
    async fn test_killed_driver_fails_until_restarted() {
        // Arrange
        let driver = MockInputDriver::new();
        driver.kill();

        // Act / Assert
        assert!(matches!(
            driver.move_to(0, 0).await,
            Err(DriverError::SubprocessExited)
        ));
        driver.restart().await.unwrap();
        driver.move_to(0, 0).await.unwrap();
        assert_eq!(driver.restart_count(), 1);
    }
}
