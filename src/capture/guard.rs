//! Clipboard guard: scoped save/restore of the clipboard text.

use std::sync::{Arc, Mutex, PoisonError};

use crate::resolver::ClipboardProvider;

/// Preserves the user's clipboard across a capture.
///
/// [`with_guard`](Self::with_guard) snapshots the clipboard, runs the
/// operation, and writes the snapshot back on every exit path,
/// including unwinding. Guarded sections are serialized, so two
/// dispatches never interleave clipboard mutations.
pub struct ClipboardGuard {
    clipboard: Arc<dyn ClipboardProvider>,
    section: Mutex<()>,
}

impl ClipboardGuard {
    pub fn new(clipboard: Arc<dyn ClipboardProvider>) -> Self {
        Self {
            clipboard,
            section: Mutex::new(()),
        }
    }

    /// Run `op` between a clipboard save and restore.
    pub fn with_guard<T>(&self, op: impl FnOnce() -> T) -> T {
        let _section = self.section.lock().unwrap_or_else(PoisonError::into_inner);
        // Declared after the lock so it is restored before the lock is
        // released.
        let _snapshot = Snapshot::take(&*self.clipboard);
        op()
    }
}

/// Clipboard text captured before a guarded operation. Restored on drop.
///
/// `None` means the snapshot read failed; the clipboard is then left
/// as the operation leaves it rather than overwritten with a guess.
struct Snapshot<'a> {
    clipboard: &'a dyn ClipboardProvider,
    text: Option<String>,
}

impl<'a> Snapshot<'a> {
    fn take(clipboard: &'a dyn ClipboardProvider) -> Self {
        let text = match clipboard.read_text() {
            Ok(text) => {
                tracing::trace!(len = text.len(), "clipboard saved");
                Some(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard snapshot failed, it will not be restored");
                None
            }
        };
        Self { clipboard, text }
    }
}

impl Drop for Snapshot<'_> {
    fn drop(&mut self) {
        let Some(text) = &self.text else {
            return;
        };
        let result = if text.is_empty() {
            self.clipboard.clear()
        } else {
            self.clipboard.write_text(text)
        };
        match result {
            Ok(()) => tracing::trace!(len = text.len(), "clipboard restored"),
            Err(e) => tracing::warn!(error = %e, "clipboard restore failed"),
        }
    }
}
