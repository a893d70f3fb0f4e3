//! X11 hotkey backend: global key grabs via `XGrabKey` on the root
//! window.

use std::sync::Arc;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, GrabMode, ModMask, Window};
use x11rb::rust_connection::RustConnection;

use crate::engine::hotkey::Hotkey;
use crate::hotkey::keybinding::{self, Binding};
use crate::hotkey::x11::lock_variants;
use crate::resolver::{HotkeyBackend, ResolverError};

/// Grabs keys on the root window with NumLock/CapsLock masking.
///
/// Each binding is grabbed four times (with and without each lock
/// modifier). A binding counts as registered only if all four succeed;
/// a partial grab is rolled back.
pub struct X11HotkeyBackend {
    conn: Arc<RustConnection>,
    root: Window,
    numlock_mask: u16,
}

impl X11HotkeyBackend {
    pub fn new(shared: &super::X11Shared) -> Self {
        Self {
            conn: Arc::clone(&shared.conn),
            root: shared.root,
            numlock_mask: shared.numlock_mask,
        }
    }

    fn ungrab_variants(&self, binding: &Binding) {
        for lock_mask in lock_variants(self.numlock_mask) {
            let mods = ModMask::from(binding.modifiers | lock_mask);
            if let Err(e) = xproto::ungrab_key(&*self.conn, binding.keycode, self.root, mods) {
                tracing::debug!(
                    binding = %binding.raw,
                    error = %e,
                    "XUngrabKey failed"
                );
            }
        }
        if let Err(e) = self.conn.flush() {
            tracing::debug!(error = %e, "flush after ungrab failed");
        }
    }
}

impl HotkeyBackend for X11HotkeyBackend {
    fn grab(&mut self, hotkey: &Hotkey) -> Result<Binding, ResolverError> {
        let binding = keybinding::resolve_binding(hotkey, &*self.conn, self.conn.setup())?;

        let mut failure = None;
        for lock_mask in lock_variants(self.numlock_mask) {
            let mods = ModMask::from(binding.modifiers | lock_mask);

            let cookie = xproto::grab_key(
                &*self.conn,
                true, // owner_events
                self.root,
                mods,
                binding.keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|e| ResolverError::Hotkey(format!("grab_key send: {e}")))?;

            // An error reply means another client holds the combination.
            if let Err(e) = cookie.check() {
                tracing::debug!(
                    binding = %binding.raw,
                    lock_mask,
                    error = %e,
                    "XGrabKey failed"
                );
                failure = Some(e);
                break;
            }
        }

        match failure {
            None => Ok(binding),
            Some(e) => {
                self.ungrab_variants(&binding);
                Err(ResolverError::Hotkey(format!(
                    "{} is claimed by another application ({e})",
                    binding.raw
                )))
            }
        }
    }

    fn ungrab(&mut self, binding: &Binding) {
        self.ungrab_variants(binding);
    }

    fn lock_mask(&self) -> u16 {
        self.numlock_mask
    }
}
