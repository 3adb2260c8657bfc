//! X11 input via one `xdotool` process per event.
//!
//! Every driver call builds an argument list and runs `xdotool` to
//! completion.  Process start-up costs a few milliseconds per event, which is
//! acceptable at viewer input rates and needs nothing but the tool on `PATH`.
//!
//! | Command               | Arguments                          |
//! |-----------------------|------------------------------------|
//! | move                  | `mousemove <x> <y>`                |
//! | button down / up      | `mousedown <n>` / `mouseup <n>`    |
//! | wheel                 | `click --repeat <steps> 4\|5`      |
//! | key down / up         | `keydown <keysym>` / `keyup <keysym>` |
//! | text                  | `type -- <text>`                   |
//!
//! X11 models the wheel as buttons 4 (up) and 5 (down), one click per notch.

use async_trait::async_trait;
use deskrelay_core::keymap::KeyMapper;
use deskrelay_core::{parse_geometry, InputCommand, KeyId, MouseButton, ScreenGeometry};
use tokio::process::Command;
use tracing::debug;

use super::{DriverError, InputDriver};

const TOOL: &str = "xdotool";
const INSTALL_HINT: &str = "install it with your package manager, e.g. `apt install xdotool`";

/// Builds the `xdotool` arguments for `command`.
///
/// Returns `None` when there is nothing to run: a zero wheel, empty text, or
/// a key with no keysym.
pub fn command_args(command: &InputCommand) -> Option<Vec<String>> {
    let args = match command {
        InputCommand::Move { x, y } => vec!["mousemove".into(), x.to_string(), y.to_string()],
        InputCommand::ButtonDown(button) => {
            vec!["mousedown".into(), button.x11_button().to_string()]
        }
        InputCommand::ButtonUp(button) => vec!["mouseup".into(), button.x11_button().to_string()],
        InputCommand::Wheel(0) => return None,
        InputCommand::Wheel(steps) => {
            let button = if *steps > 0 { "5" } else { "4" };
            vec![
                "click".into(),
                "--repeat".into(),
                steps.unsigned_abs().to_string(),
                button.into(),
            ]
        }
        InputCommand::KeyDown(key) => vec!["keydown".into(), KeyMapper::xdotool_name(key)?.into()],
        InputCommand::KeyUp(key) => vec!["keyup".into(), KeyMapper::xdotool_name(key)?.into()],
        InputCommand::TypeText(text) if text.is_empty() => return None,
        InputCommand::TypeText(text) => vec!["type".into(), "--".into(), text.clone()],
    };
    Some(args)
}

/// Input driver backed by the `xdotool` command.
#[derive(Debug)]
pub struct XdotoolDriver {
    program: String,
    geometry: ScreenGeometry,
}

impl XdotoolDriver {
    /// Locates `xdotool` on `PATH` and queries the display size.
    ///
    /// # Errors
    ///
    /// [`DriverError::ToolNotFound`] when the binary is missing; other errors
    /// when the geometry query fails or prints something unexpected.
    pub async fn connect() -> Result<Self, DriverError> {
        Self::with_program(TOOL).await
    }

    /// Like [`XdotoolDriver::connect`] with an explicit binary path.
    pub async fn with_program(program: impl Into<String>) -> Result<Self, DriverError> {
        let program = program.into();
        let stdout = run(&program, &["getdisplaygeometry".to_owned()]).await?;
        let geometry = parse_geometry(&stdout)?;
        debug!(%geometry, "xdotool display geometry");
        Ok(Self { program, geometry })
    }

    async fn send(&self, command: InputCommand) -> Result<(), DriverError> {
        match command_args(&command) {
            Some(args) => run(&self.program, &args).await.map(|_| ()),
            None => {
                debug!(command = ?command, "no xdotool mapping; dropped");
                Ok(())
            }
        }
    }
}

/// Runs `program` to completion and returns its stdout.
async fn run(program: &str, args: &[String]) -> Result<String, DriverError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| DriverError::from_spawn(program, INSTALL_HINT, e))?;

    if !output.status.success() {
        return Err(DriverError::CommandFailed {
            tool: program.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl InputDriver for XdotoolDriver {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.send(InputCommand::Move { x, y }).await
    }

    async fn button_down(&self, button: MouseButton) -> Result<(), DriverError> {
        self.send(InputCommand::ButtonDown(button)).await
    }

    async fn button_up(&self, button: MouseButton) -> Result<(), DriverError> {
        self.send(InputCommand::ButtonUp(button)).await
    }

    async fn wheel(&self, steps: i32) -> Result<(), DriverError> {
        self.send(InputCommand::Wheel(steps)).await
    }

    async fn key_down(&self, key: &KeyId) -> Result<(), DriverError> {
        self.send(InputCommand::KeyDown(key.clone())).await
    }

    async fn key_up(&self, key: &KeyId) -> Result<(), DriverError> {
        self.send(InputCommand::KeyUp(key.clone())).await
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.send(InputCommand::TypeText(text.to_owned())).await
    }
}
