//! deskrelay-host library crate.
//!
//! Runs on the machine being shared.  It never accepts connections; instead
//! it polls the relay, which makes it work from behind NAT and firewalls.
//!
//! # What does the host do? (for beginners)
//!
//! Two loops run side by side:
//!
//! 1. **Capture loop** – while a viewer is watching, capture the screen,
//!    optionally shrink and re-encode the frame, and upload it to the relay.
//! 2. **Poll loop** – fetch the control snapshots viewers posted since the
//!    last poll, diff each one against what has already been applied, and
//!    turn the differences into real mouse and keyboard events.
//!
//! A snapshot is the *full* input state (pointer position, held buttons,
//! held keys), not a list of events.  Replaying the same snapshot twice is
//! therefore harmless: the second time there is nothing left to change.
//!
//! ```text
//!   relay ──controls──▶ PollLoop ──▶ ReplayEngine ──▶ InputDriver ──▶ OS
//!     ▲                    │
//!     │                 WakeMonitor ── awake flag ──┐
//!     │                                             ▼
//!     └───────image──────────────────────────── CaptureLoop
//! ```

/// Application layer: replay engine, wake state, the two loops.
pub mod application;

/// Infrastructure layer: input drivers, relay client, capture, compression, config.
pub mod infrastructure;
