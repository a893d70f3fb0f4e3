//! X11 selections via `xclip`: the CLIPBOARD provider and the PRIMARY
//! selection source.
//!
//! X11 keeps the most recent mouse/keyboard selection in PRIMARY without
//! any copy command, which makes it the direct control query: reading it
//! injects no input into the foreground application.
//!
//! Every `xclip` run is bounded by a deadline. A selection owner that
//! never answers (a frozen application) would otherwise stall the
//! clipboard guard and every dispatch queued behind it.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::resolver::{ClipboardProvider, ResolverError, SelectionSource};

/// Longest a single `xclip` run may take.
pub const XCLIP_TIMEOUT: Duration = Duration::from_millis(1000);

/// One named X11 selection accessed through `xclip -selection <name>`.
#[derive(Debug, Clone)]
struct Xclip {
    program: PathBuf,
    selection: &'static str,
    timeout: Duration,
}

impl Xclip {
    fn new(selection: &'static str) -> Self {
        Self {
            program: PathBuf::from("xclip"),
            selection,
            timeout: XCLIP_TIMEOUT,
        }
    }

    /// Read the selection as text. A selection with no owner (xclip
    /// exits non-zero) reads as empty.
    fn read(&self) -> std::io::Result<String> {
        let mut child = Command::new(&self.program)
            .args(["-selection", self.selection, "-o"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        // Drain stdout on its own thread so a large selection cannot
        // fill the pipe while we wait for the exit status.
        let (tx, rx) = mpsc::channel();
        if let Some(mut stdout) = child.stdout.take() {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let result = stdout.read_to_end(&mut buf).map(|_| buf);
                let _ = tx.send(result);
            });
        }

        let status = self.wait(&mut child)?;
        if !status.success() {
            tracing::trace!(
                selection = self.selection,
                status = %status,
                "xclip -o found no owner"
            );
            return Ok(String::new());
        }

        let stdout = rx
            .recv_timeout(self.timeout)
            .map_err(|_| timed_out("xclip output"))??;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn write(&self, text: &str) -> std::io::Result<()> {
        let mut child = Command::new(&self.program)
            .args(["-selection", self.selection])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Fed from its own thread: a stuck xclip must not block us on a
        // full pipe. Dropping stdin closes it so xclip can take ownership.
        if let Some(mut stdin) = child.stdin.take() {
            let bytes = text.as_bytes().to_vec();
            std::thread::spawn(move || {
                if let Err(e) = stdin.write_all(&bytes) {
                    tracing::debug!(error = %e, "xclip stdin write failed");
                }
            });
        }

        let status = self.wait(&mut child)?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "xclip exited with status {status}"
            )))
        }
    }

    /// Wait for `child` up to the deadline, killing it on expiry.
    fn wait(&self, child: &mut Child) -> std::io::Result<ExitStatus> {
        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(status),
            None => {
                tracing::warn!(
                    selection = self.selection,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "xclip did not finish, killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                Err(timed_out("xclip"))
            }
        }
    }
}

fn timed_out(what: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::TimedOut, format!("{what} timed out"))
}

/// X11 CLIPBOARD selection via `xclip`.
pub struct X11ClipboardProvider {
    xclip: Xclip,
}

impl X11ClipboardProvider {
    pub fn new() -> Self {
        Self {
            xclip: Xclip::new("clipboard"),
        }
    }

    #[cfg(test)]
    fn with_program(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            xclip: Xclip {
                program: program.into(),
                selection: "clipboard",
                timeout,
            },
        }
    }
}

impl Default for X11ClipboardProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardProvider for X11ClipboardProvider {
    fn read_text(&self) -> Result<String, ResolverError> {
        self.xclip
            .read()
            .map_err(|e| ResolverError::Clipboard(format!("xclip -o: {e}")))
    }

    fn write_text(&self, text: &str) -> Result<(), ResolverError> {
        self.xclip
            .write(text)
            .map_err(|e| ResolverError::Clipboard(format!("xclip: {e}")))
    }
}

/// X11 PRIMARY selection: whatever text is currently highlighted.
pub struct PrimarySelection {
    xclip: Xclip,
}

impl PrimarySelection {
    pub fn new() -> Self {
        Self {
            xclip: Xclip::new("primary"),
        }
    }
}

impl Default for PrimarySelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSource for PrimarySelection {
    fn selected_text(&self) -> Result<Option<String>, ResolverError> {
        let text = self
            .xclip
            .read()
            .map_err(|e| ResolverError::Selection(format!("xclip -o primary: {e}")))?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }
}
