//! Foreground-application access: synthetic input and direct selection
//! queries.

use std::time::Duration;

use super::ResolverError;

/// Drives the focused application with synthetic key events.
pub trait KeyInjector: Send + Sync {
    /// Bring the currently active window to the front and give it
    /// input focus.
    fn focus_foreground(&self) -> Result<(), ResolverError>;

    /// Wait until every non-modifier key is up, so the key that fired
    /// the hotkey no longer holds the keyboard. Fails if a key is still
    /// held after `timeout`.
    fn await_key_release(&self, timeout: Duration) -> Result<(), ResolverError>;

    /// Send the platform copy shortcut to the focused control.
    fn send_copy(&self) -> Result<(), ResolverError>;
}

/// Reads the focused control's selected text without injecting input.
pub trait SelectionSource: Send + Sync {
    /// Current selection, or `None` if nothing is selected.
    fn selected_text(&self) -> Result<Option<String>, ResolverError>;
}
