//! Relay configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! `main.rs` builds it from CLI arguments and environment variables; tests
//! build it from [`Default`] and override the fields they care about.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use deskrelay_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,

    /// Cadence at which the frame stream re-emits the latest image.
    pub frame_interval: Duration,

    /// Largest accepted image upload in bytes.  Larger bodies get 413.
    pub max_image_bytes: usize,

    /// How many recent control snapshots each session keeps.
    pub control_queue_cap: usize,

    /// Sessions with no activity for this long are evicted.
    ///
    /// `None` keeps every session for the life of the process.
    pub session_ttl: Option<Duration>,
}

impl ServerConfig {
    /// How often the idle sweeper runs for a given TTL: a quarter of it,
    /// never more often than once a second.
    pub fn sweep_interval(ttl: Duration) -> Duration {
        (ttl / 4).max(Duration::from_secs(1))
    }
}

impl Default for ServerConfig {
    /// | Field             | Default        |
    /// |-------------------|----------------|
    /// | bind_addr         | `0.0.0.0:8080` |
    /// | frame_interval    | 100 ms         |
    /// | max_image_bytes   | 10 MiB         |
    /// | control_queue_cap | 50             |
    /// | session_ttl       | 1 hour         |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            frame_interval: Duration::from_millis(100),
            max_image_bytes: 10 * 1024 * 1024,
            control_queue_cap: 50,
            session_ttl: Some(Duration::from_secs(3600)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Arrange / Act
        let cfg = ServerConfig::default();

        // Assert
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.frame_interval, Duration::from_millis(100));
        assert_eq!(cfg.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.control_queue_cap, 50);
        assert_eq!(cfg.session_ttl, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_sweep_interval_is_quarter_ttl_with_floor() {
        assert_eq!(
            ServerConfig::sweep_interval(Duration::from_secs(3600)),
            Duration::from_secs(900)
        );
        assert_eq!(
            ServerConfig::sweep_interval(Duration::from_secs(2)),
            Duration::from_secs(1)
        );
    }
}
