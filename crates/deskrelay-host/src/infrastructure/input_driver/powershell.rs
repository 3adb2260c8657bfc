//! Windows input through one persistent PowerShell subprocess.
//!
//! Starting a process per event is too slow on Windows, so this driver
//! starts `powershell.exe -NoProfile -NonInteractive -Command -` once and
//! writes a bootstrap script to its stdin.  The script compiles a small C#
//! wrapper around `SendInput` and then loops reading one JSON object per
//! line:
//!
//! ```text
//! {"cmd":"move","x":10,"y":20}
//! {"cmd":"button","flags":2,"data":0}
//! {"cmd":"wheel","delta":-240}
//! {"cmd":"key","vk":65,"down":true}
//! {"cmd":"text","text":"hello"}
//! ```
//!
//! # Lifetime (for beginners)
//!
//! The driver owns the child's stdin behind an async mutex, so commands are
//! written one whole line at a time and `write_all` + `flush` wait for the
//! pipe to drain before the next command goes out.
//!
//! A watcher task waits on the child.  When it exits, the watcher clears the
//! `alive` flag and every later send returns
//! [`DriverError::SubprocessExited`] at once instead of blocking on a dead
//! pipe.  [`InputDriver::restart`] starts a fresh subprocess.

use std::process::Stdio;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use deskrelay_core::keymap::KeyMapper;
use deskrelay_core::{parse_geometry, KeyId, MouseButton, ScreenGeometry};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdin, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{DriverError, InputDriver};

const TOOL: &str = "powershell.exe";
const INSTALL_HINT: &str = "Windows PowerShell ships with Windows; check that it is on PATH";

/// Arguments that make PowerShell read its script from stdin.
const SUBPROCESS_ARGS: &[&str] = &["-NoProfile", "-NonInteractive", "-Command", "-"];

/// Prints the primary screen's size as `"<width> <height>"`.
const GEOMETRY_SCRIPT: &str = "Add-Type -AssemblyName System.Windows.Forms; \
$b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
Write-Output (\"{0} {1}\" -f $b.Width, $b.Height)";

/// Script written to the subprocess at start-up: the `SendInput` wrapper
/// and the JSON read loop.  The loop is a single line so it runs as soon as
/// PowerShell reads it.
pub const BOOTSTRAP_SCRIPT: &str = r##"$ErrorActionPreference = 'Stop'
Add-Type -TypeDefinition @"
using System;
using System.Runtime.InteropServices;
public static class DeskRelayInput {
    [StructLayout(LayoutKind.Sequential)]
    public struct MOUSEINPUT { public int dx; public int dy; public uint mouseData; public uint dwFlags; public uint time; public IntPtr dwExtraInfo; }
    [StructLayout(LayoutKind.Sequential)]
    public struct KEYBDINPUT { public ushort wVk; public ushort wScan; public uint dwFlags; public uint time; public IntPtr dwExtraInfo; }
    [StructLayout(LayoutKind.Explicit)]
    public struct InputUnion { [FieldOffset(0)] public MOUSEINPUT mi; [FieldOffset(0)] public KEYBDINPUT ki; }
    [StructLayout(LayoutKind.Sequential)]
    public struct INPUT { public uint type; public InputUnion u; }
    [DllImport("user32.dll", SetLastError = true)]
    static extern uint SendInput(uint count, INPUT[] inputs, int size);
    [DllImport("user32.dll")]
    static extern bool SetCursorPos(int x, int y);
    static void Send(INPUT input) { SendInput(1, new INPUT[] { input }, Marshal.SizeOf(typeof(INPUT))); }
    public static void Move(int x, int y) { SetCursorPos(x, y); }
    public static void Mouse(uint flags, int data) { INPUT i = new INPUT(); i.type = 0; i.u.mi.dwFlags = flags; i.u.mi.mouseData = unchecked((uint)data); Send(i); }
    public static void Key(ushort vk, bool down, bool ext) { INPUT i = new INPUT(); i.type = 1; i.u.ki.wVk = vk; i.u.ki.dwFlags = (down ? 0u : 2u) | (ext ? 1u : 0u); Send(i); }
    public static void Text(string s) { foreach (char c in s) { foreach (bool down in new bool[] { true, false }) { INPUT i = new INPUT(); i.type = 1; i.u.ki.wScan = c; i.u.ki.dwFlags = 4u | (down ? 0u : 2u); Send(i); } } }
}
"@

while ($true) { $line = [Console]::In.ReadLine(); if ($null -eq $line) { break }; if ($line.Trim().Length -eq 0) { continue }; try { $c = ConvertFrom-Json $line; switch ($c.cmd) { 'move' { [DeskRelayInput]::Move([int]$c.x, [int]$c.y) } 'button' { [DeskRelayInput]::Mouse([uint32]$c.flags, [int]$c.data) } 'wheel' { [DeskRelayInput]::Mouse(0x0800, [int]$c.delta) } 'key' { [DeskRelayInput]::Key([uint16]$c.vk, [bool]$c.down, [bool]$c.ext) } 'text' { [DeskRelayInput]::Text([string]$c.text) } } } catch { [Console]::Error.WriteLine($_.Exception.Message) } }
"##;

/// Native wheel units per notch.
pub const WHEEL_DELTA: i32 = 120;

// ── Line protocol ─────────────────────────────────────────────────────────────

/// One line of the subprocess protocol.
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum WireCommand<'a> {
    Move { x: i32, y: i32 },
    /// Raw `MOUSEINPUT.dwFlags` / `mouseData` for a button transition.
    Button { flags: u32, data: i32 },
    /// Native wheel delta: positive scrolls up.
    Wheel { delta: i32 },
    Key {
        vk: u8,
        down: bool,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        ext: bool,
    },
    Text { text: &'a str },
}

impl WireCommand<'_> {
    /// Encodes the command as one newline-terminated JSON line.
    pub fn to_line(&self) -> Result<Vec<u8>, DriverError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// `SendInput` flags and `mouseData` for pressing or releasing `button`.
pub fn button_command(button: MouseButton, down: bool) -> WireCommand<'static> {
    const XBUTTON1: i32 = 0x0001;
    const XBUTTON2: i32 = 0x0002;
    let (down_flag, up_flag, data) = match button {
        MouseButton::Left => (0x0002, 0x0004, 0),
        MouseButton::Right => (0x0008, 0x0010, 0),
        MouseButton::Middle => (0x0020, 0x0040, 0),
        MouseButton::Back => (0x0080, 0x0100, XBUTTON1),
        MouseButton::Forward => (0x0080, 0x0100, XBUTTON2),
    };
    WireCommand::Button {
        flags: if down { down_flag } else { up_flag },
        data,
    }
}

/// Wheel command for `steps` notches (positive is down).
///
/// Windows counts positive deltas as scrolling up, so the sign flips.
pub fn wheel_command(steps: i32) -> WireCommand<'static> {
    WireCommand::Wheel {
        delta: -steps * WHEEL_DELTA,
    }
}

/// Virtual keys that need `KEYEVENTF_EXTENDEDKEY` to reach the right
/// physical key (navigation cluster, right-hand modifiers, numpad divide).
pub fn is_extended_vk(vk: u8) -> bool {
    matches!(
        vk,
        0x21..=0x28 // PageUp, PageDown, End, Home, arrows
            | 0x2C // PrintScreen
            | 0x2D // Insert
            | 0x2E // Delete
            | 0x5B..=0x5D // Left/Right Win, Apps
            | 0x6F // Numpad divide
            | 0x90 // NumLock
            | 0xA3 // Right Ctrl
            | 0xA5 // Right Alt
    )
}

// ── Subprocess ────────────────────────────────────────────────────────────────

struct Subprocess {
    stdin: ChildStdin,
    alive: Arc<AtomicBool>,
}

async fn spawn_subprocess(program: &str, args: &[String]) -> Result<Subprocess, DriverError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DriverError::from_spawn(program, INSTALL_HINT, e))?;

    let mut stdin = child.stdin.take().ok_or(DriverError::SubprocessExited)?;
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(log_stderr(stderr));
    }

    let alive = Arc::new(AtomicBool::new(true));
    let watcher_flag = Arc::clone(&alive);
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => error!(%status, "input subprocess exited"),
            Err(e) => error!("failed to wait on input subprocess: {e}"),
        }
        watcher_flag.store(false, Ordering::Release);
    });

    stdin.write_all(BOOTSTRAP_SCRIPT.as_bytes()).await?;
    stdin.flush().await?;
    info!(program, "input subprocess started");
    Ok(Subprocess { stdin, alive })
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!("input subprocess: {line}");
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Input driver backed by a persistent PowerShell process.
pub struct PowerShellDriver {
    program: String,
    args: Vec<String>,
    geometry: ScreenGeometry,
    process: Mutex<Subprocess>,
}

impl PowerShellDriver {
    /// Queries the primary screen size and starts the input subprocess.
    ///
    /// # Errors
    ///
    /// [`DriverError::ToolNotFound`] when `powershell.exe` cannot be run;
    /// other errors when the geometry query fails.
    pub async fn connect() -> Result<Self, DriverError> {
        Self::with_program(TOOL).await
    }

    /// Like [`PowerShellDriver::connect`] with an explicit binary, e.g. `pwsh`.
    pub async fn with_program(program: impl Into<String>) -> Result<Self, DriverError> {
        let program = program.into();
        let geometry = query_geometry(&program).await?;
        debug!(%geometry, "PowerShell display geometry");
        let args = SUBPROCESS_ARGS.iter().map(|a| (*a).to_owned()).collect();
        Self::spawn(program, args, geometry).await
    }

    /// Starts `program args` as the input subprocess with a known geometry.
    pub async fn spawn(
        program: String,
        args: Vec<String>,
        geometry: ScreenGeometry,
    ) -> Result<Self, DriverError> {
        let process = spawn_subprocess(&program, &args).await?;
        Ok(Self {
            program,
            args,
            geometry,
            process: Mutex::new(process),
        })
    }

    /// Returns `true` while the subprocess is running.
    pub async fn is_alive(&self) -> bool {
        self.process.lock().await.alive.load(Ordering::Acquire)
    }

    async fn send(&self, command: &WireCommand<'_>) -> Result<(), DriverError> {
        let line = command.to_line()?;
        let mut process = self.process.lock().await;
        if !process.alive.load(Ordering::Acquire) {
            return Err(DriverError::SubprocessExited);
        }
        let written = match process.stdin.write_all(&line).await {
            Ok(()) => process.stdin.flush().await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                process.alive.store(false, Ordering::Release);
                Err(DriverError::SubprocessExited)
            }
            Err(e) => Err(DriverError::Io(e)),
        }
    }

    async fn send_key(&self, key: &KeyId, down: bool) -> Result<(), DriverError> {
        let Some(vk) = KeyMapper::windows_vk(key) else {
            debug!(key = ?key, "no virtual key mapping; dropped");
            return Ok(());
        };
        self.send(&WireCommand::Key {
            vk,
            down,
            ext: is_extended_vk(vk),
        })
        .await
    }
}

async fn query_geometry(program: &str) -> Result<ScreenGeometry, DriverError> {
    let output = Command::new(program)
        .args(["-NoProfile", "-NonInteractive", "-Command", GEOMETRY_SCRIPT])
        .output()
        .await
        .map_err(|e| DriverError::from_spawn(program, INSTALL_HINT, e))?;
    if !output.status.success() {
        return Err(DriverError::CommandFailed {
            tool: program.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(parse_geometry(&String::from_utf8_lossy(&output.stdout))?)
}

#[async_trait]
impl InputDriver for PowerShellDriver {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.send(&WireCommand::Move { x, y }).await
    }

    async fn button_down(&self, button: MouseButton) -> Result<(), DriverError> {
        self.send(&button_command(button, true)).await
    }

    async fn button_up(&self, button: MouseButton) -> Result<(), DriverError> {
        self.send(&button_command(button, false)).await
    }

    async fn wheel(&self, steps: i32) -> Result<(), DriverError> {
        if steps == 0 {
            return Ok(());
        }
        self.send(&wheel_command(steps)).await
    }

    async fn key_down(&self, key: &KeyId) -> Result<(), DriverError> {
        self.send_key(key, true).await
    }

    async fn key_up(&self, key: &KeyId) -> Result<(), DriverError> {
        self.send_key(key, false).await
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        if text.is_empty() {
            return Ok(());
        }
        self.send(&WireCommand::Text { text }).await
    }

    async fn restart(&self) -> Result<(), DriverError> {
        let mut process = self.process.lock().await;
        *process = spawn_subprocess(&self.program, &self.args).await?;
        Ok(())
    }
}
