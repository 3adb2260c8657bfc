//! Timing shared by the viewer heartbeat and the host's wake/sleep logic.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A host stays awake while the newest control snapshot is at most this old.
pub const WAKE_WINDOW: Duration = Duration::from_secs(30);

/// How often an open viewer posts a heartbeat snapshot.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Current wall-clock time in epoch milliseconds.
///
/// Returns 0 if the system clock is set before 1970.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns `true` if `time` is no older than `window` relative to `now`.
///
/// A `time` ahead of `now` (relay clock slightly ahead of the host) counts
/// as fresh.
pub fn is_within(time: u64, now: u64, window: Duration) -> bool {
    now.saturating_sub(time) <= window.as_millis() as u64
}
