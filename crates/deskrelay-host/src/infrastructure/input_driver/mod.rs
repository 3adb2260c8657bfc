//! Input drivers: the backends that turn [`InputCommand`]s into OS input.
//!
//! Two real backends implement the same [`InputDriver`] contract:
//!
//! - [`xdotool::XdotoolDriver`] spawns one short-lived `xdotool` process per
//!   event (X11 desktops).
//! - [`powershell::PowerShellDriver`] starts one long-lived PowerShell process
//!   that calls `SendInput` and is fed one JSON line per event (Windows).
//!
//! [`mock::MockInputDriver`] records commands in memory for tests.
//! [`detect::open_driver`] picks a backend at startup.
//!
//! # Why a trait? (for beginners)
//!
//! The replay engine only decides *which* events to send and in which order.
//! How an event reaches the OS differs completely between backends, so the
//! engine holds an `Arc<dyn InputDriver>` and never knows which one it has.
//! Tests hand it the mock instead.

pub mod detect;
pub mod mock;
pub mod powershell;
pub mod xdotool;

use async_trait::async_trait;
use deskrelay_core::{GeometryError, InputCommand, KeyId, MouseButton, ScreenGeometry};
use thiserror::Error;

/// Errors an input driver can report.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The backend's external tool is not installed or not on `PATH`.
    #[error("{tool} not found: {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// The persistent input subprocess has exited; nothing more can be sent
    /// until it is restarted.
    #[error("input subprocess has exited")]
    SubprocessExited,

    /// The external tool ran but reported failure.
    #[error("{tool} failed ({status}): {stderr}")]
    CommandFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// The display size reported by the backend could not be used.
    #[error("display geometry unavailable: {0}")]
    Geometry(#[from] GeometryError),

    /// Spawning or talking to a process failed for a reason other than a
    /// missing binary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command could not be encoded for the line protocol.
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    /// Injected by [`mock::MockInputDriver`].
    #[error("mock failure")]
    Mock,
}

impl DriverError {
    /// Classifies a spawn error: a missing binary becomes
    /// [`DriverError::ToolNotFound`], anything else stays an I/O error.
    pub(crate) fn from_spawn(tool: &str, hint: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            DriverError::ToolNotFound {
                tool: tool.to_owned(),
                hint: hint.to_owned(),
            }
        } else {
            DriverError::Io(err)
        }
    }
}

/// Capability set every input backend provides.
///
/// Coordinates are absolute pixels within [`InputDriver::geometry`].  Keys a
/// backend cannot express are dropped with a debug log and reported as
/// success.
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    /// Primary display size, queried once when the driver was built.
    fn geometry(&self) -> ScreenGeometry;

    async fn move_to(&self, x: i32, y: i32) -> Result<(), DriverError>;

    async fn button_down(&self, button: MouseButton) -> Result<(), DriverError>;

    async fn button_up(&self, button: MouseButton) -> Result<(), DriverError>;

    /// Scrolls by `steps` notches; positive is down.  Zero is a no-op.
    async fn wheel(&self, steps: i32) -> Result<(), DriverError>;

    async fn key_down(&self, key: &KeyId) -> Result<(), DriverError>;

    async fn key_up(&self, key: &KeyId) -> Result<(), DriverError>;

    /// Types `text` as characters, independent of any held keys.
    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Brings a dead backend back.  Backends without a long-lived process
    /// have nothing to restart.
    async fn restart(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Sends one [`InputCommand`] through the matching driver method.
pub async fn dispatch(driver: &dyn InputDriver, command: &InputCommand) -> Result<(), DriverError> {
    match command {
        InputCommand::Move { x, y } => driver.move_to(*x, *y).await,
        InputCommand::ButtonDown(button) => driver.button_down(*button).await,
        InputCommand::ButtonUp(button) => driver.button_up(*button).await,
        InputCommand::Wheel(steps) => driver.wheel(*steps).await,
        InputCommand::KeyDown(key) => driver.key_down(key).await,
        InputCommand::KeyUp(key) => driver.key_up(key).await,
        InputCommand::TypeText(text) => driver.type_text(text).await,
    }
}
