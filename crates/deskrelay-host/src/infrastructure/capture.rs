//! Screen capture by running an external command.
//!
//! The command must write exactly one encoded image (PNG, JPEG, ...) to
//! stdout and exit 0.  Defaults:
//!
//! | OS      | Command                                                  |
//! |---------|----------------------------------------------------------|
//! | Windows | PowerShell + `System.Drawing`, primary screen as PNG     |
//! | others  | ImageMagick `import -window root png:-`                  |
//!
//! Any other tool can be plugged in with `--capture-cmd`, e.g.
//! `grim -` on wlroots compositors.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;

use crate::application::host_loop::FrameSource;

const WINDOWS_CAPTURE_SCRIPT: &str = "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
$b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
$bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
$g = [System.Drawing.Graphics]::FromImage($bmp); \
$g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
$ms = New-Object System.IO.MemoryStream; \
$bmp.Save($ms, [System.Drawing.Imaging.ImageFormat]::Png); \
$out = [Console]::OpenStandardOutput(); $ms.WriteTo($out); $out.Flush()";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture command is empty")]
    EmptyCommand,

    #[error("capture tool {0} not found on PATH")]
    ToolNotFound(String),

    #[error("failed to run capture command: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture command failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("capture command wrote nothing to stdout")]
    NoOutput,
}

/// Runs `program args...` once per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrameSource {
    program: String,
    args: Vec<String>,
}

impl CommandFrameSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace.  No quoting is supported.
    pub fn parse(command_line: &str) -> Result<Self, CaptureError> {
        let mut words = command_line.split_whitespace().map(str::to_owned);
        let program = words.next().ok_or(CaptureError::EmptyCommand)?;
        Ok(Self::new(program, words.collect()))
    }

    /// The default capture command for the current OS.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new(
                "powershell",
                ["-NoProfile", "-NonInteractive", "-Command", WINDOWS_CAPTURE_SCRIPT]
                    .map(str::to_owned)
                    .to_vec(),
            )
        } else {
            Self::new("import", ["-window", "root", "png:-"].map(str::to_owned).to_vec())
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl FrameSource for CommandFrameSource {
    async fn capture(&self) -> Result<Bytes, CaptureError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CaptureError::ToolNotFound(self.program.clone()),
                _ => CaptureError::Io(e),
            })?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::NoOutput);
        }
        Ok(Bytes::from(output.stdout))
    }
}
