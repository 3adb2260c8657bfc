//! Host runtime configuration and the persisted session id.
//!
//! The session id names this host's slot on the relay.  Unless one is given
//! on the command line it is generated once and kept in
//!
//! - Linux:   `~/.config/deskrelay/session_id`
//! - Windows: `%APPDATA%\deskrelay\session_id`
//! - macOS:   `~/Library/Application Support/deskrelay/session_id`
//!
//! so viewer bookmarks keep working across restarts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::compress::CompressSettings;
use super::input_driver::detect::BackendChoice;

const APP_DIR: &str = "deskrelay";
const SESSION_ID_FILE: &str = "session_id";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session ids end up in URL paths, so they are restricted to
    /// `[A-Za-z0-9._-]`.
    #[error("invalid session id {0:?}: use 1-128 characters from A-Z a-z 0-9 . _ -")]
    InvalidSessionId(String),
}

/// Everything the host needs at runtime.  Built by `main.rs` from CLI flags
/// and `DESKRELAY_*` environment variables.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Relay base URL, e.g. `http://relay.example:8080`.
    pub relay_url: String,
    pub session_id: String,
    /// Control poll cadence.
    pub poll_interval: Duration,
    /// Frame capture cadence while awake.
    pub update_interval: Duration,
    /// Input backend; [`BackendChoice::None`] disables replay.
    pub backend: BackendChoice,
    /// Custom capture command line; `None` uses the OS default.
    pub capture_command: Option<String>,
    /// `None` uploads frames as captured.
    pub compress: Option<CompressSettings>,
    /// Snapshots older than this on arrival are not replayed.
    pub freshness: Duration,
}

pub fn validate_session_id(id: &str) -> Result<(), ConfigError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidSessionId(id.to_owned()))
    }
}

/// `<platform config dir>/deskrelay/session_id`.
pub fn session_id_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SESSION_ID_FILE))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Reads the session id stored at `path`, generating and saving a new
/// UUID v4 if the file is missing or blank.
///
/// # Errors
///
/// I/O failures other than "not found", and a stored id that fails
/// [`validate_session_id`].
pub fn load_or_create_session_id(path: &Path) -> Result<String, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if !contents.trim().is_empty() => {
            let id = contents.trim().to_owned();
            validate_session_id(&id)?;
            return Ok(id);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_owned(),
                source,
            })
        }
    }

    let id = Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_owned(),
            source,
        })?;
    }
    std::fs::write(path, format!("{id}\n")).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;
    info!(path = %path.display(), "generated new session id");
    Ok(id)
}

/// The explicit id when given, otherwise the persisted one.
pub fn resolve_session_id(explicit: Option<&str>) -> Result<String, ConfigError> {
    match explicit.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => {
            validate_session_id(id)?;
            Ok(id.to_owned())
        }
        None => load_or_create_session_id(&session_id_path()?),
    }
}
