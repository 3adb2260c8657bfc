//! deskrelay host: entry point.
//!
//! Shares this machine's screen through a deskrelay relay and replays the
//! mouse and keyboard input that browser viewers post.
//!
//! # Usage
//!
//! ```text
//! deskrelay-host [OPTIONS]
//!
//! Options:
//!   --url            <URL>    Relay base URL [default: http://127.0.0.1:8080]
//!   --session-id     <ID>     Session id; persisted UUID when omitted
//!   --poll-ms        <MS>     Control poll cadence [default: 10]
//!   --update-ms      <MS>     Frame capture cadence [default: 100]
//!   --input          <BOOL>   Replay viewer input [default: true]
//!   --backend        <NAME>   auto | xdotool | powershell | none [default: auto]
//!   --capture-cmd    <CMD>    Command writing one image to stdout
//!   --compress       <BOOL>   Re-encode frames before upload [default: true]
//!   --format         <FMT>    jpeg | png | webp [default: jpeg]
//!   --quality        <1-100>  JPEG quality [default: 70]
//!   --max-dim        <PX>     Longest frame edge, 0 keeps native [default: 1920]
//!   --freshness-ms   <MS>     Drop snapshots older than this [default: 5000]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Flag             |
//! |------------------------------|------------------|
//! | `DESKRELAY_URL`              | `--url`          |
//! | `DESKRELAY_SESSION_ID`       | `--session-id`   |
//! | `DESKRELAY_POLL_MS`          | `--poll-ms`      |
//! | `DESKRELAY_UPDATE_MS`        | `--update-ms`    |
//! | `DESKRELAY_INPUT`            | `--input`        |
//! | `DESKRELAY_BACKEND`          | `--backend`      |
//! | `DESKRELAY_CAPTURE_CMD`      | `--capture-cmd`  |
//! | `DESKRELAY_COMPRESS`         | `--compress`     |
//! | `DESKRELAY_COMPRESS_FORMAT`  | `--format`       |
//! | `DESKRELAY_COMPRESS_QUALITY` | `--quality`      |
//! | `DESKRELAY_COMPRESS_MAX_DIM` | `--max-dim`      |
//! | `DESKRELAY_FRESHNESS_MS`     | `--freshness-ms` |
//!
//! CLI args take precedence when both are present.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{ensure, Context};
use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deskrelay_host::application::host_loop::{run_capture_loop, run_poll_loop};
use deskrelay_host::application::{CaptureLoop, FrameCompressor, PollLoop, RelayApi, ReplayEngine, WakeMonitor};
use deskrelay_host::infrastructure::capture::CommandFrameSource;
use deskrelay_host::infrastructure::compress::{CompressFormat, CompressSettings, ImageCompressor};
use deskrelay_host::infrastructure::config::{resolve_session_id, HostConfig};
use deskrelay_host::infrastructure::input_driver::detect::{open_driver, BackendChoice};
use deskrelay_host::infrastructure::input_driver::{DriverError, InputDriver};
use deskrelay_host::infrastructure::relay_client::RelayClient;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// deskrelay controlled host.
///
/// Uploads screen frames to a relay while a viewer is watching and replays
/// the viewer's mouse and keyboard input on this machine.
#[derive(Debug, Parser)]
#[command(
    name = "deskrelay-host",
    about = "Share this desktop through a deskrelay relay",
    version
)]
struct Cli {
    /// Relay base URL.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "DESKRELAY_URL")]
    url: String,

    /// Session id viewers connect to.  A UUID is generated and persisted
    /// when omitted.
    #[arg(long, env = "DESKRELAY_SESSION_ID")]
    session_id: Option<String>,

    /// Milliseconds between control polls.
    #[arg(long, default_value_t = 10, env = "DESKRELAY_POLL_MS")]
    poll_ms: u64,

    /// Milliseconds between frame captures while awake.
    #[arg(long, default_value_t = 100, env = "DESKRELAY_UPDATE_MS")]
    update_ms: u64,

    /// Replay viewer input on this machine.
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "DESKRELAY_INPUT")]
    input: bool,

    /// Input backend.
    #[arg(long, value_enum, default_value_t = BackendChoice::Auto, env = "DESKRELAY_BACKEND")]
    backend: BackendChoice,

    /// Capture command line (whitespace-separated, no quoting); must write
    /// one image to stdout.
    #[arg(long, env = "DESKRELAY_CAPTURE_CMD")]
    capture_cmd: Option<String>,

    /// Downscale and re-encode frames before upload.
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "DESKRELAY_COMPRESS")]
    compress: bool,

    /// Upload format when compressing.
    #[arg(long, value_enum, default_value_t = CompressFormat::Jpeg, env = "DESKRELAY_COMPRESS_FORMAT")]
    format: CompressFormat,

    /// JPEG quality.
    #[arg(
        long,
        default_value_t = 70,
        value_parser = clap::value_parser!(u8).range(1..=100),
        env = "DESKRELAY_COMPRESS_QUALITY"
    )]
    quality: u8,

    /// Longest frame edge in pixels after downscaling.  `0` keeps the native size.
    #[arg(long, default_value_t = 1920, env = "DESKRELAY_COMPRESS_MAX_DIM")]
    max_dim: u32,

    /// Snapshots older than this many milliseconds on arrival are dropped.
    #[arg(long, default_value_t = 5000, env = "DESKRELAY_FRESHNESS_MS")]
    freshness_ms: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`HostConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if either interval or the freshness window is zero,
    /// or if `--capture-cmd` is blank.
    fn into_host_config(self, session_id: String) -> anyhow::Result<HostConfig> {
        ensure!(self.poll_ms > 0, "--poll-ms must be greater than zero");
        ensure!(self.update_ms > 0, "--update-ms must be greater than zero");
        ensure!(self.freshness_ms > 0, "--freshness-ms must be greater than zero");
        if let Some(cmd) = &self.capture_cmd {
            ensure!(!cmd.trim().is_empty(), "--capture-cmd must not be blank");
        }

        Ok(HostConfig {
            relay_url: self.url,
            session_id,
            poll_interval: Duration::from_millis(self.poll_ms),
            update_interval: Duration::from_millis(self.update_ms),
            backend: if self.input { self.backend } else { BackendChoice::None },
            capture_command: self.capture_cmd,
            compress: self.compress.then_some(CompressSettings {
                format: self.format,
                quality: self.quality,
                max_dim: (self.max_dim > 0).then_some(self.max_dim),
            }),
            freshness: Duration::from_millis(self.freshness_ms),
        })
    }
}

/// Opens the input backend.  Failure is not fatal: the host keeps sharing
/// its screen without replay.
async fn open_input(backend: BackendChoice) -> Option<Arc<dyn InputDriver>> {
    match open_driver(backend).await {
        Ok(Some(driver)) => Some(driver),
        Ok(None) => {
            info!("input replay disabled by configuration");
            None
        }
        Err(DriverError::ToolNotFound { tool, hint }) => {
            warn!("input replay disabled: {tool} not found ({hint})");
            None
        }
        Err(e) => {
            warn!("input replay disabled: input backend failed to start: {e}");
            None
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let session_id = resolve_session_id(cli.session_id.as_deref()).context("failed to resolve session id")?;
    let config = cli.into_host_config(session_id)?;

    let relay = Arc::new(
        RelayClient::new(&config.relay_url, config.session_id.clone()).context("invalid relay URL")?,
    );
    let source = Arc::new(match &config.capture_command {
        Some(cmd) => CommandFrameSource::parse(cmd).context("invalid capture command")?,
        None => CommandFrameSource::platform_default(),
    });
    let compressor = config
        .compress
        .map(|settings| Arc::new(ImageCompressor::new(settings)) as Arc<dyn FrameCompressor>);

    info!(
        "deskrelay host starting: relay={}, session={}, capture={}, poll={:?}, update={:?}",
        config.relay_url,
        config.session_id,
        source.program(),
        config.poll_interval,
        config.update_interval
    );
    info!("viewers watch the stream at {}", relay.stream_url());

    // ── Input replay ──────────────────────────────────────────────────────────
    let engine = open_input(config.backend)
        .await
        .map(|driver| ReplayEngine::new(driver, config.freshness));

    // ── Loops ─────────────────────────────────────────────────────────────────
    let wake = WakeMonitor::new(Arc::new(AtomicBool::new(false)));
    let capture = CaptureLoop::new(source, compressor, Arc::clone(&relay) as Arc<dyn RelayApi>, wake.flag());
    let poll = PollLoop::new(relay, engine, wake);

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let capture_task = tokio::spawn(run_capture_loop(capture, config.update_interval, Arc::clone(&running)));
    let poll_task = tokio::spawn(run_poll_loop(poll, config.poll_interval, Arc::clone(&running)));

    let (capture_result, poll_result) = tokio::join!(capture_task, poll_task);
    capture_result.context("capture loop panicked")?;
    poll_result.context("poll loop panicked")?;

    info!("deskrelay host stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Cli {
        Cli::parse_from(["deskrelay-host"])
    }

    #[test]
    fn test_cli_defaults() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = defaults();

        // Assert
        assert_eq!(cli.url, "http://127.0.0.1:8080");
        assert_eq!(cli.poll_ms, 10);
        assert_eq!(cli.update_ms, 100);
        assert!(cli.input);
        assert_eq!(cli.backend, BackendChoice::Auto);
        assert!(cli.compress);
        assert_eq!(cli.format, CompressFormat::Jpeg);
        assert_eq!(cli.quality, 70);
        assert_eq!(cli.max_dim, 1920);
        assert_eq!(cli.freshness_ms, 5000);
    }

    #[test]
    fn test_into_host_config_defaults() {
        // Act
        let config = defaults().into_host_config("demo".into()).unwrap();

        // Assert
        assert_eq!(config.session_id, "demo");
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.update_interval, Duration::from_millis(100));
        assert_eq!(config.freshness, Duration::from_secs(5));
        assert_eq!(config.compress, Some(CompressSettings::default()));
        assert_eq!(config.capture_command, None);
    }

    #[test]
    fn test_input_false_disables_backend() {
        let cli = Cli::parse_from(["deskrelay-host", "--input", "false", "--backend", "xdotool"]);
        let config = cli.into_host_config("demo".into()).unwrap();
        assert_eq!(config.backend, BackendChoice::None);
    }

    #[test]
    fn test_compression_overrides() {
        // Arrange
        let cli = Cli::parse_from([
            "deskrelay-host",
            "--format",
            "webp",
            "--quality",
            "40",
            "--max-dim",
            "0",
        ]);

        // Act
        let config = cli.into_host_config("demo".into()).unwrap();

        // Assert
        assert_eq!(
            config.compress,
            Some(CompressSettings {
                format: CompressFormat::Webp,
                quality: 40,
                max_dim: None,
            })
        );
    }

    #[test]
    fn test_compress_false_uploads_raw() {
        let cli = Cli::parse_from(["deskrelay-host", "--compress", "false"]);
        assert_eq!(cli.into_host_config("demo".into()).unwrap().compress, None);
    }

    #[test]
    fn test_quality_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["deskrelay-host", "--quality", "0"]).is_err());
        assert!(Cli::try_parse_from(["deskrelay-host", "--quality", "101"]).is_err());
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let mut cli = defaults();
        cli.poll_ms = 0;
        assert!(cli.into_host_config("demo".into()).is_err());

        let mut cli = defaults();
        cli.update_ms = 0;
        assert!(cli.into_host_config("demo".into()).is_err());
    }

    #[test]
    fn test_blank_capture_command_is_rejected() {
        let mut cli = defaults();
        cli.capture_cmd = Some("   ".into());
        assert!(cli.into_host_config("demo".into()).is_err());
    }
}
