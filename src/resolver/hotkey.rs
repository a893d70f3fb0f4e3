//! HotkeyBackend trait: global key grab registration.

use crate::engine::hotkey::Hotkey;
use crate::hotkey::keybinding::Binding;

use super::ResolverError;

/// Registers and releases global key grabs.
///
/// The [`crate::hotkey::registry::HotkeyRegistry`] owns one backend and
/// drives it through full unregister/register cycles. Event delivery is
/// separate: the daemon reads raw key events and asks the registry to
/// match them against the active bindings.
pub trait HotkeyBackend {
    /// Resolve `hotkey` to a platform binding and grab it.
    ///
    /// Returns `Err` if the key is unmapped or the combination is
    /// already claimed by another client. A failed grab leaves nothing
    /// registered.
    fn grab(&mut self, hotkey: &Hotkey) -> Result<Binding, ResolverError>;

    /// Release a binding previously returned by [`grab`](Self::grab).
    /// Best-effort; errors are logged.
    fn ungrab(&mut self, binding: &Binding);

    /// Modifier bit NumLock occupies on this display. It is ignored
    /// when matching events, as is CapsLock.
    fn lock_mask(&self) -> u16;
}
