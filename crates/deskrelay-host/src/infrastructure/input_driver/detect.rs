//! Backend selection at start-up.

use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use super::powershell::PowerShellDriver;
use super::xdotool::XdotoolDriver;
use super::{DriverError, InputDriver};

/// Which input backend the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendChoice {
    /// PowerShell on Windows, xdotool everywhere else.
    #[default]
    Auto,
    Xdotool,
    #[value(name = "powershell")]
    PowerShell,
    /// No input replay at all.
    None,
}

/// A concrete backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Xdotool,
    PowerShell,
}

impl BackendChoice {
    /// Resolves the choice for a target OS name as in `std::env::consts::OS`.
    /// `None` means replay is off.
    pub fn resolve(self, os: &str) -> Option<BackendKind> {
        match self {
            BackendChoice::Auto if os == "windows" => Some(BackendKind::PowerShell),
            BackendChoice::Auto => Some(BackendKind::Xdotool),
            BackendChoice::Xdotool => Some(BackendKind::Xdotool),
            BackendChoice::PowerShell => Some(BackendKind::PowerShell),
            BackendChoice::None => None,
        }
    }
}

/// Builds the driver for `choice` on the current OS.
///
/// Returns `Ok(None)` when replay is switched off.
///
/// # Errors
///
/// Whatever the backend's constructor reports; the caller decides whether
/// to carry on without replay.
pub async fn open_driver(choice: BackendChoice) -> Result<Option<Arc<dyn InputDriver>>, DriverError> {
    let Some(kind) = choice.resolve(std::env::consts::OS) else {
        return Ok(None);
    };
    let driver: Arc<dyn InputDriver> = match kind {
        BackendKind::Xdotool => Arc::new(XdotoolDriver::connect().await?),
        BackendKind::PowerShell => Arc::new(PowerShellDriver::connect().await?),
    };
    info!(
        backend = driver.name(),
        geometry = %driver.geometry(),
        "input driver ready"
    );
    Ok(Some(driver))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_follows_the_os() {
        assert_eq!(BackendChoice::Auto.resolve("windows"), Some(BackendKind::PowerShell));
        assert_eq!(BackendChoice::Auto.resolve("linux"), Some(BackendKind::Xdotool));
        assert_eq!(BackendChoice::Auto.resolve("freebsd"), Some(BackendKind::Xdotool));
    }

    #[test]
    fn test_explicit_choices_ignore_the_os() {
        assert_eq!(BackendChoice::PowerShell.resolve("linux"), Some(BackendKind::PowerShell));
        assert_eq!(BackendChoice::Xdotool.resolve("windows"), Some(BackendKind::Xdotool));
        assert_eq!(BackendChoice::None.resolve("linux"), None);
    }

    #[tokio::test]
    async fn test_none_opens_no_driver() {
        let driver = open_driver(BackendChoice::None).await.unwrap();
        assert!(driver.is_none());
    }

    #[test]
    fn test_value_names() {
        assert_eq!(BackendChoice::from_str("powershell", true), Ok(BackendChoice::PowerShell));
        assert_eq!(BackendChoice::from_str("none", true), Ok(BackendChoice::None));
    }
}
