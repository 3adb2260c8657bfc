//! Application layer for the controlled host.
//!
//! - **`replay`** – diffs control snapshots against the input state already
//!   applied and emits the minimal set of [`deskrelay_core::InputCommand`]s.
//! - **`wake`** – decides whether anybody is watching.
//! - **`host_loop`** – the capture and poll loops, plus the collaborator
//!   traits they are written against.

pub mod host_loop;
pub mod replay;
pub mod wake;

pub use host_loop::{CaptureLoop, FrameCompressor, FrameSource, PollLoop, RelayApi};
pub use replay::{ReplayEngine, ReplayState};
pub use wake::{WakeMonitor, WakeState};
