//! The host's two periodic loops.
//!
//! ```text
//!  capture loop (every update interval)        poll loop (every poll interval)
//!  ────────────────────────────────────        ───────────────────────────────
//!  awake? ──no──▶ skip                         GET controls?since=<newest>
//!    │yes                                        │
//!  capture ─▶ compress ─▶ POST image           ReplayEngine::apply_batch
//!                                                │
//!                     ◀─── awake flag ───────  WakeMonitor::observe
//! ```
//!
//! The loops share nothing but the awake flag.  The replay state lives inside
//! the poll loop's [`ReplayEngine`], so the capture loop can never observe a
//! half-applied snapshot.
//!
//! Transport failures are never fatal: the first failure in a row is logged
//! at `warn`, repeats at `debug`, and the next tick simply tries again.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deskrelay_core::{now_ms, ControlSnapshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::replay::ReplayEngine;
use super::wake::{WakeMonitor, WakeState};
use crate::infrastructure::capture::CaptureError;
use crate::infrastructure::relay_client::RelayClientError;

// ── Collaborator traits ───────────────────────────────────────────────────────

/// The relay endpoints the host uses.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn post_image(&self, image: Bytes) -> Result<(), RelayClientError>;

    /// Snapshots stamped after `since`, ascending.
    async fn fetch_controls(&self, since: Option<u64>) -> Result<Vec<ControlSnapshot>, RelayClientError>;
}

/// Produces one encoded screen frame per call.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Bytes, CaptureError>;
}

/// Re-encodes a frame.  Must hand back the input unchanged when it cannot
/// make it smaller.
pub trait FrameCompressor: Send + Sync {
    fn compress(&self, frame: Bytes) -> Bytes;
}

/// Counts consecutive failures so only the first of a run is loud.
#[derive(Debug, Default)]
struct FailureRun(u32);

impl FailureRun {
    fn failed(&mut self, what: &str, err: &dyn std::fmt::Display) {
        if self.0 == 0 {
            warn!("{what} failed: {err}");
        } else {
            debug!(consecutive = self.0 + 1, "{what} failed: {err}");
        }
        self.0 += 1;
    }

    fn succeeded(&mut self, what: &str) {
        if self.0 > 0 {
            info!(failures = self.0, "{what} recovered");
        }
        self.0 = 0;
    }
}

// ── Capture loop ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Nobody is watching; nothing was captured.
    Asleep,
    Uploaded { bytes: usize },
    Failed,
}

/// Capture, compress, upload.
pub struct CaptureLoop {
    source: Arc<dyn FrameSource>,
    compressor: Option<Arc<dyn FrameCompressor>>,
    relay: Arc<dyn RelayApi>,
    awake: Arc<AtomicBool>,
    failures: FailureRun,
}

impl CaptureLoop {
    pub fn new(
        source: Arc<dyn FrameSource>,
        compressor: Option<Arc<dyn FrameCompressor>>,
        relay: Arc<dyn RelayApi>,
        awake: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            compressor,
            relay,
            awake,
            failures: FailureRun::default(),
        }
    }

    /// One capture cycle.
    pub async fn tick(&mut self) -> CaptureOutcome {
        if !self.awake.load(Ordering::Acquire) {
            return CaptureOutcome::Asleep;
        }

        let frame = match self.source.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                self.failures.failed("frame capture", &e);
                return CaptureOutcome::Failed;
            }
        };

        let frame = match &self.compressor {
            Some(compressor) => {
                let compressor = Arc::clone(compressor);
                let original = frame.clone();
                // Image re-encoding is CPU-bound; keep it off the async workers.
                match tokio::task::spawn_blocking(move || compressor.compress(frame)).await {
                    Ok(compressed) => compressed,
                    Err(e) => {
                        warn!("frame compression task failed: {e}");
                        original
                    }
                }
            }
            None => frame,
        };

        let bytes = frame.len();
        match self.relay.post_image(frame).await {
            Ok(()) => {
                self.failures.succeeded("frame upload");
                CaptureOutcome::Uploaded { bytes }
            }
            Err(e) => {
                self.failures.failed("frame upload", &e);
                CaptureOutcome::Failed
            }
        }
    }
}

// ── Poll loop ─────────────────────────────────────────────────────────────────

/// What one poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub fetched: usize,
    /// Input commands sent to the driver.
    pub commands: usize,
    pub wake: WakeState,
}

/// Fetch controls, replay them, update the wake state.
pub struct PollLoop {
    relay: Arc<dyn RelayApi>,
    engine: Option<ReplayEngine>,
    wake: WakeMonitor,
    newest_time: Option<u64>,
    failures: FailureRun,
}

impl PollLoop {
    /// `engine` is `None` when input replay is off; polling still drives
    /// the wake state.
    pub fn new(relay: Arc<dyn RelayApi>, engine: Option<ReplayEngine>, wake: WakeMonitor) -> Self {
        Self {
            relay,
            engine,
            wake,
            newest_time: None,
            failures: FailureRun::default(),
        }
    }

    /// Newest snapshot `time` seen so far; the `since` cursor of the next poll.
    pub fn newest_time(&self) -> Option<u64> {
        self.newest_time
    }

    pub fn engine(&self) -> Option<&ReplayEngine> {
        self.engine.as_ref()
    }

    /// One poll cycle at wall-clock `now_ms`.
    pub async fn tick(&mut self, now_ms: u64) -> PollOutcome {
        let mut fetched = 0;
        let mut commands = 0;

        match self.relay.fetch_controls(self.newest_time).await {
            Ok(snapshots) => {
                self.failures.succeeded("control poll");
                fetched = snapshots.len();
                if let Some(newest) = snapshots.iter().filter_map(|s| s.time).max() {
                    self.newest_time = Some(self.newest_time.map_or(newest, |t| t.max(newest)));
                }
                if let Some(engine) = self.engine.as_mut() {
                    match engine.apply_batch(snapshots, now_ms).await {
                        Ok(sent) => commands = sent,
                        Err(e) => error!("input replay stopped: {e}"),
                    }
                }
            }
            Err(e) => self.failures.failed("control poll", &e),
        }

        let wake = self.wake.observe(self.newest_time, now_ms);
        PollOutcome {
            fetched,
            commands,
            wake,
        }
    }

    /// Releases anything still held down.  Called once on shutdown.
    pub async fn shutdown(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.release_all().await {
            Ok(0) => {}
            Ok(released) => info!(released, "released held input"),
            Err(e) => warn!("failed to release held input: {e}"),
        }
    }
}

// ── Runners ───────────────────────────────────────────────────────────────────

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Runs the capture loop every `period` until `running` is cleared.
pub async fn run_capture_loop(mut capture: CaptureLoop, period: Duration, running: Arc<AtomicBool>) {
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
        if let CaptureOutcome::Uploaded { bytes } = capture.tick().await {
            debug!(bytes, "frame uploaded");
        }
    }
    info!("capture loop stopped");
}

/// Runs the poll loop every `period` until `running` is cleared, then
/// releases held input.
pub async fn run_poll_loop(mut poll: PollLoop, period: Duration, running: Arc<AtomicBool>) {
    let mut ticker = ticker(period);
    loop {
        ticker.tick().await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
        poll.tick(now_ms()).await;
    }
    poll.shutdown().await;
    info!("poll loop stopped");
}
