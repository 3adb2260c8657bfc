//! SessionRegistry: the relay's in-memory store of frames and control state.
//!
//! Each session id maps to a [`SessionEntry`] holding:
//!
//! - The latest uploaded image (replaced whole on every upload).
//! - A bounded queue of the most recent control snapshots, each stamped by
//!   the relay on arrival.
//! - The last time anything referenced the session, for idle eviction.
//!
//! # Locking (for beginners)
//!
//! Many viewers and one host hit the relay at once, so the registry is shared
//! between request handlers.  Two levels of locking keep them out of each
//! other's way:
//!
//! ```text
//! RwLock<HashMap<id, Arc<SessionEntry>>>     ← held only to find/insert an entry
//!         │
//!         └── SessionEntry
//!               ├── RwLock<Option<Bytes>>   ← image
//!               ├── Mutex<ControlQueue>     ← control snapshots
//!               └── Mutex<Instant>          ← last activity
//! ```
//!
//! The map lock is released before any per-entry lock is taken, so an image
//! upload on session A never waits for a control read on session B.  Values
//! are swapped in whole (`Bytes` is a reference-counted buffer), so a reader
//! always sees a complete image, never a partial write.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use deskrelay_core::{now_ms, ControlSnapshot};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

// ── Session entry ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ControlQueue {
    snapshots: VecDeque<ControlSnapshot>,
    last_stamp: u64,
}

/// State the relay keeps for one session.
#[derive(Debug)]
pub struct SessionEntry {
    image: RwLock<Option<Bytes>>,
    controls: Mutex<ControlQueue>,
    last_activity: Mutex<Instant>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            image: RwLock::new(None),
            controls: Mutex::new(ControlQueue::default()),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// The latest image, if any has been uploaded.
    pub fn latest_image(&self) -> Option<Bytes> {
        self.image.read().clone()
    }

    /// Buffered snapshots stamped after `since` (all of them for `None`),
    /// oldest first.
    pub fn controls_since(&self, since: Option<u64>) -> Vec<ControlSnapshot> {
        let queue = self.controls.lock();
        queue
            .snapshots
            .iter()
            .filter(|s| match (since, s.time) {
                (Some(since), Some(time)) => time > since,
                _ => true,
            })
            .cloned()
            .collect()
    }

    fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_activity.lock())
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// In-memory registry of every live session.
///
/// Entries are created lazily on first reference and removed only by
/// [`SessionRegistry::evict_idle`].  Nothing survives a restart.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionEntry>>>,
    control_queue_cap: usize,
}

impl SessionRegistry {
    /// Creates an empty registry keeping up to `control_queue_cap` snapshots
    /// per session (at least one).
    pub fn new(control_queue_cap: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            control_queue_cap: control_queue_cap.max(1),
        }
    }

    /// Returns the entry for `session_id`, creating an empty one if absent.
    ///
    /// Every call counts as activity for idle eviction.  Never fails.
    pub fn get_session(&self, session_id: &str) -> Arc<SessionEntry> {
        if let Some(entry) = self.sessions.read().get(session_id) {
            entry.touch();
            return Arc::clone(entry);
        }
        let mut sessions = self.sessions.write();
        let entry = sessions.entry(session_id.to_owned()).or_insert_with(|| {
            debug!(session = session_id, "created session");
            Arc::new(SessionEntry::new())
        });
        entry.touch();
        Arc::clone(entry)
    }

    /// Replaces the session's latest image.  No format validation happens here.
    pub fn post_image(&self, session_id: &str, image: Bytes) {
        let entry = self.get_session(session_id);
        debug!(session = session_id, bytes = image.len(), "image posted");
        *entry.image.write() = Some(image);
    }

    /// Stamps `snapshot` with the relay clock and appends it to the session's
    /// queue, dropping the oldest snapshot once the queue is full.
    ///
    /// Stamps are strictly increasing per session: if the clock has not moved
    /// past the previous stamp, the previous stamp plus one is used.  Returns
    /// the snapshot as stored.
    pub fn post_controls(&self, session_id: &str, mut snapshot: ControlSnapshot) -> ControlSnapshot {
        let entry = self.get_session(session_id);
        let mut queue = entry.controls.lock();

        let stamp = now_ms().max(queue.last_stamp + 1);
        queue.last_stamp = stamp;
        snapshot.time = Some(stamp);

        if queue.snapshots.len() >= self.control_queue_cap {
            queue.snapshots.pop_front();
        }
        queue.snapshots.push_back(snapshot.clone());
        snapshot
    }

    /// Buffered snapshots newer than `since`, ascending by time.
    pub fn controls_since(&self, session_id: &str, since: Option<u64>) -> Vec<ControlSnapshot> {
        self.get_session(session_id).controls_since(since)
    }

    /// The latest image for `session_id`.
    pub fn latest_image(&self, session_id: &str) -> Option<Bytes> {
        self.get_session(session_id).latest_image()
    }

    /// Removes every session idle for at least `ttl`.  Returns how many were removed.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.idle_for(now) < ttl;
            if !keep {
                info!(session = %id, "evicting idle session");
            }
            keep
        });
        before - sessions.len()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(50)
    }
}
