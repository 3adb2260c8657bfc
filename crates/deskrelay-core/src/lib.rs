//! # deskrelay-core
//!
//! Shared library for deskrelay containing the control snapshot wire model,
//! the input command vocabulary, display geometry helpers, and key identifier
//! translation tables.
//!
//! This crate is used by both the relay server and the controlled host.
//! It has zero dependencies on OS APIs, HTTP frameworks, or sockets.
//!
//! # Architecture overview (for beginners)
//!
//! deskrelay lets a browser tab watch a remote desktop and drive its mouse and
//! keyboard.  The browser (the *viewer*) and the remote desktop (the
//! *controlled host*) never talk to each other directly: both talk to an HTTP
//! relay that stores the latest screen frame and the latest input state for
//! each session.
//!
//! This crate (`deskrelay-core`) is the shared foundation.  It defines:
//!
//! - **`snapshot`** – The JSON unit the viewer posts: where the mouse is,
//!   which buttons and keys are held, and how far the wheel moved.
//!
//! - **`command`** – The primitive input events (move, button down/up, wheel,
//!   key down/up, text) that the host's replay engine sends to an input driver.
//!
//! - **`geometry`** – Screen size parsing and coordinate denormalization.
//!
//! - **`keymap`** – Translation tables that convert browser key identifiers
//!   (DOM `KeyboardEvent.code`) to the native names each backend understands
//!   (X11 keysym names for `xdotool`, Windows Virtual Key codes for `SendInput`),
//!   using USB HID Usage IDs as the canonical pivot.
//!
//! - **`relay`** – The JSON bodies of the relay's HTTP endpoints, shared so
//!   the server and the host cannot drift apart.
//!
//! - **`wake`** – Timing constants shared by the viewer heartbeat and the
//!   host's wake/sleep state machine.

pub mod command;
pub mod geometry;
pub mod keymap;
pub mod relay;
pub mod snapshot;
pub mod wake;

// Re-export the most-used types at the crate root so callers can write
// `deskrelay_core::ControlSnapshot` instead of the full module path.
pub use command::InputCommand;
pub use geometry::{parse_geometry, GeometryError, ScreenGeometry};
pub use keymap::hid::HidKeyCode;
pub use snapshot::{
    ButtonMask, ControlSnapshot, KeyId, KeyIdentity, MouseButton, MouseState, SnapshotError, Wheel,
};
pub use wake::now_ms;
