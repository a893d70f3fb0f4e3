//! X11 key event plumbing: lock-modifier detection and the event thread.
//!
//! The event thread polls the X11 connection fd and forwards key presses
//! to the daemon's async loop, where they are matched against the
//! [`HotkeyRegistry`](super::registry::HotkeyRegistry).

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{self, Keysym};
use x11rb::rust_connection::RustConnection;

use super::keybinding::keycodes_for_keysym;

/// CapsLock modifier bit (always LockMask, bit 1).
pub const LOCK_MASK: u16 = 0x0002;

/// XK_Num_Lock keysym for dynamic modifier detection.
const XK_NUM_LOCK: Keysym = 0xff7f;

/// A key press on a grabbed combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub keycode: u8,
    /// Raw modifier state, lock bits included.
    pub state: u16,
}

/// Lock mask combinations a grab must cover so the hotkey fires with
/// any state of CapsLock and NumLock: `[0, Caps, Num, Caps|Num]`.
pub fn lock_variants(numlock_mask: u16) -> [u16; 4] {
    [0, LOCK_MASK, numlock_mask, LOCK_MASK | numlock_mask]
}

/// Detect which modifier bit corresponds to NumLock by querying the
/// X11 modifier mapping and keyboard mapping.
///
/// Falls back to Mod2 (0x0010) if detection fails; this is the most
/// common mapping and matches xmodmap defaults.
pub fn detect_numlock_mask(conn: &RustConnection) -> u16 {
    const FALLBACK: u16 = 0x0010; // Mod2Mask

    let Some(mod_reply) = xproto::get_modifier_mapping(conn)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
    else {
        return FALLBACK;
    };

    let keycodes_per_mod = mod_reply.keycodes_per_modifier() as usize;
    if keycodes_per_mod == 0 {
        return FALLBACK;
    }

    let numlock_keycodes = keycodes_for_keysym(conn, conn.setup(), XK_NUM_LOCK);
    if numlock_keycodes.is_empty() {
        return FALLBACK;
    }

    // Modifier map: 8 rows × keycodes_per_modifier. Row i is mask bit 1 << i.
    mod_reply
        .keycodes
        .chunks(keycodes_per_mod)
        .take(8)
        .position(|row| {
            row.iter()
                .any(|&kc| kc != 0 && numlock_keycodes.contains(&kc))
        })
        .map_or(FALLBACK, |idx| 1u16 << idx)
}

/// Spawn a dedicated thread that polls the X11 connection for events.
///
/// Uses `nix::poll()` on the X11 connection fd with a 100ms timeout.
/// When readable, drains all available events via `poll_for_event()`.
/// Checks the `stop` flag each iteration for clean shutdown.
///
/// Only `KeyPress` events are forwarded. Returns the receiver channel
/// and the thread join handle. The channel closes when the thread
/// exits, including on a connection error.
pub fn spawn_event_thread(
    conn: Arc<RustConnection>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<(tokio::sync::mpsc::UnboundedReceiver<KeyPress>, JoinHandle<()>)> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = std::thread::Builder::new()
        .name("x11-events".into())
        .spawn(move || {
            let raw_fd = conn.stream().as_raw_fd();

            while !stop.load(Ordering::Relaxed) {
                // SAFETY: raw_fd is the X11 connection fd, valid while conn is alive.
                let borrowed = unsafe { BorrowedFd::borrow_raw(raw_fd) };
                let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];

                match poll(&mut fds, PollTimeout::from(100u16)) {
                    Ok(0) => continue,
                    Ok(_) => loop {
                        match conn.poll_for_event() {
                            Ok(Some(Event::KeyPress(e))) => {
                                let press = KeyPress {
                                    keycode: e.detail,
                                    state: u16::from(e.state),
                                };
                                if tx.send(press).is_err() {
                                    return;
                                }
                            }
                            Ok(Some(_)) => {}
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(error = %e, "X11 connection error");
                                return;
                            }
                        }
                    },
                    Err(nix::Error::EINTR) => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "poll error on X11 fd");
                        return;
                    }
                }
            }
        })?;

    Ok((rx, handle))
}
