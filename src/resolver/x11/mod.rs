//! X11 platform adapters.
//!
//! All adapters share one `Arc<RustConnection>` created by
//! [`X11Shared::connect`]. Clipboard and PRIMARY-selection access go
//! through `xclip`; key grabs and synthetic input use the core protocol
//! and the XTEST extension.

pub mod clipboard;
pub mod hotkey;
pub mod input;

use std::sync::Arc;

use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{self, Atom, Window};
use x11rb::protocol::xtest;
use x11rb::rust_connection::RustConnection;

use super::ResolverError;

/// Shared X11 connection state used by all adapters.
pub struct X11Shared {
    pub conn: Arc<RustConnection>,
    /// Root window of the default screen.
    pub root: Window,
    /// `_NET_ACTIVE_WINDOW` atom (focus queries and activation requests).
    pub net_active_window: Atom,
    /// Dynamically detected NumLock modifier mask.
    pub numlock_mask: u16,
    /// Whether the server supports XTEST (simulated copy).
    pub xtest: bool,
}

impl X11Shared {
    /// Connect to the X11 display and intern required atoms.
    pub fn connect() -> Result<Self, ResolverError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| ResolverError::Display(format!("X11 connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let net_active_window = xproto::intern_atom(&conn, false, b"_NET_ACTIVE_WINDOW")
            .map_err(|e| ResolverError::Display(format!("intern_atom: {e}")))?
            .reply()
            .map_err(|e| ResolverError::Display(format!("intern_atom reply: {e}")))?
            .atom;

        let numlock_mask = crate::hotkey::x11::detect_numlock_mask(&conn);
        tracing::debug!(
            numlock_mask = format_args!("0x{numlock_mask:04x}"),
            "X11Shared: detected NumLock modifier"
        );

        let version = xtest::get_version(&conn, 2, 2)
            .map_err(ReplyError::from)
            .and_then(|cookie| cookie.reply());
        let xtest = match version {
            Ok(reply) => {
                tracing::debug!(
                    major = reply.major_version,
                    minor = reply.minor_version,
                    "XTEST available"
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "XTEST unavailable, simulated copy disabled");
                false
            }
        };

        Ok(Self {
            conn: Arc::new(conn),
            root,
            net_active_window,
            numlock_mask,
            xtest,
        })
    }
}
