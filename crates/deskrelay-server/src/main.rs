//! deskrelay relay server: entry point.
//!
//! This binary serves the HTTP relay that viewers and controlled hosts both
//! talk to.  It stores the latest screen frame and recent control snapshots
//! per session and streams frames back to viewers.
//!
//! # Usage
//!
//! ```text
//! deskrelay-server [OPTIONS]
//!
//! Options:
//!   --bind              <ADDR>   Listen address [default: 0.0.0.0]
//!   --port              <PORT>   Listen port [default: 8080]
//!   --frame-ms          <MS>     Frame stream cadence [default: 100]
//!   --max-image-bytes   <BYTES>  Largest accepted upload [default: 10485760]
//!   --control-queue     <N>      Snapshots kept per session [default: 50]
//!   --session-ttl-secs  <SECS>   Idle eviction threshold, 0 disables [default: 3600]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Default    |
//! |------------------------------|------------|
//! | `DESKRELAY_BIND`             | `0.0.0.0`  |
//! | `DESKRELAY_PORT`             | `8080`     |
//! | `DESKRELAY_FRAME_MS`         | `100`      |
//! | `DESKRELAY_MAX_IMAGE_BYTES`  | `10485760` |
//! | `DESKRELAY_CONTROL_QUEUE`    | `50`       |
//! | `DESKRELAY_SESSION_TTL_SECS` | `3600`     |
//!
//! CLI args take precedence when both are present.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deskrelay_server::domain::ServerConfig;
use deskrelay_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// deskrelay HTTP relay.
///
/// Brokers screen frames and control snapshots between browser viewers and
/// controlled hosts that cannot reach each other directly.
#[derive(Debug, Parser)]
#[command(
    name = "deskrelay-server",
    about = "HTTP relay between deskrelay viewers and controlled hosts",
    version
)]
struct Cli {
    /// IP address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0", env = "DESKRELAY_BIND")]
    bind: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = 8080, env = "DESKRELAY_PORT")]
    port: u16,

    /// Milliseconds between parts of the frame stream.
    #[arg(long, default_value_t = 100, env = "DESKRELAY_FRAME_MS")]
    frame_ms: u64,

    /// Largest image upload accepted, in bytes.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "DESKRELAY_MAX_IMAGE_BYTES")]
    max_image_bytes: usize,

    /// Number of recent control snapshots kept per session.
    #[arg(long, default_value_t = 50, env = "DESKRELAY_CONTROL_QUEUE")]
    control_queue: usize,

    /// Evict sessions idle for this many seconds.  `0` keeps them forever.
    #[arg(long, default_value_t = 3600, env = "DESKRELAY_SESSION_TTL_SECS")]
    session_ttl_secs: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address or if
    /// `--frame-ms` or `--control-queue` is zero.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        ensure!(self.frame_ms > 0, "--frame-ms must be greater than zero");
        ensure!(self.control_queue > 0, "--control-queue must be greater than zero");

        Ok(ServerConfig {
            bind_addr,
            frame_interval: Duration::from_millis(self.frame_ms),
            max_image_bytes: self.max_image_bytes,
            control_queue_cap: self.control_queue,
            session_ttl: (self.session_ttl_secs > 0)
                .then(|| Duration::from_secs(self.session_ttl_secs)),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` controls the level; absent or invalid falls back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "deskrelay relay starting: bind={}, frame_interval={:?}, session_ttl={:?}",
        config.bind_addr, config.frame_interval, config.session_ttl
    );

    // ── Graceful shutdown flag ─────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("deskrelay relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Cli {
        Cli::parse_from(["deskrelay-server"])
    }

    #[test]
    fn test_cli_defaults() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = defaults();

        // Assert
        assert_eq!(cli.bind, "0.0.0.0");
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.frame_ms, 100);
        assert_eq!(cli.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(cli.control_queue, 50);
        assert_eq!(cli.session_ttl_secs, 3600);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "deskrelay-server",
            "--bind",
            "127.0.0.1",
            "--port",
            "9000",
            "--frame-ms",
            "250",
            "--control-queue",
            "8",
        ]);
        assert_eq!(cli.bind, "127.0.0.1");
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.frame_ms, 250);
        assert_eq!(cli.control_queue, 8);
    }

    #[test]
    fn test_into_server_config_defaults() {
        // Act
        let config = defaults().into_server_config().unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.frame_interval, Duration::from_millis(100));
        assert_eq!(config.session_ttl, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_zero_ttl_disables_eviction() {
        let cli = Cli::parse_from(["deskrelay-server", "--session-ttl-secs", "0"]);
        let config = cli.into_server_config().unwrap();
        assert_eq!(config.session_ttl, None);
    }

    #[test]
    fn test_invalid_bind_returns_error() {
        // Arrange
        let mut cli = defaults();
        cli.bind = "not.an.ip".to_string();

        // Act
        let result = cli.into_server_config();

        // Assert: must return an error, not panic
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_frame_interval_is_rejected() {
        let mut cli = defaults();
        cli.frame_ms = 0;
        assert!(cli.into_server_config().is_err());
    }

    #[test]
    fn test_zero_control_queue_is_rejected() {
        let mut cli = defaults();
        cli.control_queue = 0;
        assert!(cli.into_server_config().is_err());
    }
}
