//! Primitive input commands issued by the replay engine.
//!
//! Every backend implements the same vocabulary; the replay engine plans a
//! `Vec<InputCommand>` for each snapshot and hands it to the driver in order.

use crate::snapshot::{KeyId, MouseButton};

/// One low-level input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Move the pointer to absolute pixel coordinates.
    Move { x: i32, y: i32 },
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    /// Scroll by whole notches; positive is down.
    Wheel(i32),
    KeyDown(KeyId),
    KeyUp(KeyId),
    /// Inject text as characters, independent of held-key state.
    TypeText(String),
}

impl InputCommand {
    /// Short lowercase name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InputCommand::Move { .. } => "move",
            InputCommand::ButtonDown(_) => "button_down",
            InputCommand::ButtonUp(_) => "button_up",
            InputCommand::Wheel(_) => "wheel",
            InputCommand::KeyDown(_) => "key_down",
            InputCommand::KeyUp(_) => "key_up",
            InputCommand::TypeText(_) => "type_text",
        }
    }
}
