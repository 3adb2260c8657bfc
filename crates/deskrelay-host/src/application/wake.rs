//! Wake/sleep state: capture frames only while a viewer is watching.
//!
//! An open viewer posts a heartbeat snapshot every 30 seconds, and every real
//! input snapshot is stamped by the relay too, so "the newest snapshot is at
//! most 30 seconds old" means "somebody is looking".  While nobody is, the
//! capture loop skips its work entirely.
//!
//! ```text
//!            newest time within window
//!   Asleep ─────────────────────────────▶ Awake
//!     ▲                                     │
//!     └─────────────────────────────────────┘
//!        newest time outside window, or none
//! ```
//!
//! The state is owned by the poll loop; the capture loop only reads the
//! shared `awake` flag.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use deskrelay_core::wake::{is_within, WAKE_WINDOW};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeState {
    Awake,
    Asleep,
}

/// Tracks [`WakeState`] and mirrors it into a shared flag.
#[derive(Debug)]
pub struct WakeMonitor {
    state: WakeState,
    window: Duration,
    awake: Arc<AtomicBool>,
}

impl WakeMonitor {
    /// Starts `Asleep` with the standard 30 s window.
    pub fn new(awake: Arc<AtomicBool>) -> Self {
        Self::with_window(awake, WAKE_WINDOW)
    }

    pub fn with_window(awake: Arc<AtomicBool>, window: Duration) -> Self {
        awake.store(false, Ordering::Release);
        Self {
            state: WakeState::Asleep,
            window,
            awake,
        }
    }

    pub fn state(&self) -> WakeState {
        self.state
    }

    /// Flag shared with the capture loop.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.awake)
    }

    /// Re-evaluates the state from the newest snapshot time seen so far.
    ///
    /// Transitions are logged; the shared flag is updated before returning.
    pub fn observe(&mut self, newest_time: Option<u64>, now_ms: u64) -> WakeState {
        let next = match newest_time {
            Some(time) if is_within(time, now_ms, self.window) => WakeState::Awake,
            _ => WakeState::Asleep,
        };
        if next != self.state {
            match next {
                WakeState::Awake => info!("viewer present; frame capture resumed"),
                WakeState::Asleep => info!(
                    idle_ms = ?newest_time.map(|t| now_ms.saturating_sub(t)),
                    "no viewer activity; frame capture paused"
                ),
            }
            self.state = next;
        }
        self.awake
            .store(next == WakeState::Awake, Ordering::Release);
        next
    }
}
