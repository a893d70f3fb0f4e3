//! Capture strategies, least invasive first.

use std::sync::Arc;
use std::time::Duration;

use crate::resolver::{ClipboardProvider, KeyInjector, ResolverError, SelectionSource};

use super::{CaptureConfig, CaptureStrategy, is_usable};

/// Accept text the user already copied. No side effects.
pub struct PassiveRead {
    clipboard: Arc<dyn ClipboardProvider>,
    max_chars: usize,
}

impl PassiveRead {
    pub fn new(clipboard: Arc<dyn ClipboardProvider>, max_chars: usize) -> Self {
        Self {
            clipboard,
            max_chars,
        }
    }
}

impl CaptureStrategy for PassiveRead {
    fn name(&self) -> &'static str {
        "passive_read"
    }

    fn attempt(&self) -> Result<Option<String>, ResolverError> {
        let text = self.clipboard.read_text()?;
        if !is_usable(&text) {
            return Ok(None);
        }

        let chars = text.chars().count();
        if chars >= self.max_chars {
            // Likely stale bulk content rather than a deliberate copy.
            tracing::debug!(chars, max = self.max_chars, "clipboard text over passive bound");
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// Longest the simulated copy waits for the hotkey's key to come up.
pub const KEY_RELEASE_TIMEOUT: Duration = Duration::from_millis(500);

/// Wait for the hotkey to be released, clear the clipboard, send the copy
/// shortcut to the foreground window, and poll until the copied text
/// lands.
pub struct SimulatedCopy {
    clipboard: Arc<dyn ClipboardProvider>,
    injector: Arc<dyn KeyInjector>,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl SimulatedCopy {
    pub fn new(
        clipboard: Arc<dyn ClipboardProvider>,
        injector: Arc<dyn KeyInjector>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            clipboard,
            injector,
            poll_interval: config.poll_interval,
            poll_attempts: config.poll_attempts,
        }
    }
}

impl CaptureStrategy for SimulatedCopy {
    fn name(&self) -> &'static str {
        "simulated_copy"
    }

    fn injects_input(&self) -> bool {
        true
    }

    fn attempt(&self) -> Result<Option<String>, ResolverError> {
        self.injector.await_key_release(KEY_RELEASE_TIMEOUT)?;
        self.clipboard.clear()?;

        if let Err(e) = self.injector.focus_foreground() {
            tracing::debug!(error = %e, "focus_foreground failed, copying anyway");
        }
        self.injector.send_copy()?;

        for attempt in 1..=self.poll_attempts {
            std::thread::sleep(self.poll_interval);
            match self.clipboard.read_text() {
                Ok(text) if is_usable(&text) => {
                    tracing::trace!(attempt, "copied text arrived");
                    return Ok(Some(text));
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(attempt, error = %e, "clipboard poll failed"),
            }
        }

        tracing::debug!(attempts = self.poll_attempts, "nothing copied");
        Ok(None)
    }
}

/// Read the focused control's selection directly, without key injection.
pub struct DirectQuery {
    selection: Arc<dyn SelectionSource>,
}

impl DirectQuery {
    pub fn new(selection: Arc<dyn SelectionSource>) -> Self {
        Self { selection }
    }
}

impl CaptureStrategy for DirectQuery {
    fn name(&self) -> &'static str {
        "direct_query"
    }

    fn attempt(&self) -> Result<Option<String>, ResolverError> {
        self.selection.selected_text()
    }
}
