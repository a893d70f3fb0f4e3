//! X11 key injector: `_NET_ACTIVE_WINDOW` activation and XTEST copy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Atom, ClientMessageEvent, EventMask, InputFocus, Window};
use x11rb::protocol::xtest;
use x11rb::rust_connection::RustConnection;

use crate::hotkey::keybinding::keysym_to_keycode;
use crate::resolver::{KeyInjector, ResolverError};

const XK_CONTROL_L: u32 = 0xffe3;
const XK_C: u32 = 0x0063;

/// Modifier map row of LockMask; CapsLock is never released.
const LOCK_ROW: usize = 1;

const RELEASE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Source indication for pager/taskbar requests in `_NET_ACTIVE_WINDOW`.
const SOURCE_PAGER: u32 = 2;

/// Injects synthetic input into the focused window.
pub struct X11KeyInjector {
    conn: Arc<RustConnection>,
    root: Window,
    net_active_window: Atom,
    xtest: bool,
}

impl X11KeyInjector {
    pub fn new(shared: &super::X11Shared) -> Self {
        Self {
            conn: Arc::clone(&shared.conn),
            root: shared.root,
            net_active_window: shared.net_active_window,
            xtest: shared.xtest,
        }
    }

    /// The window manager's active window, from `_NET_ACTIVE_WINDOW` on
    /// the root window.
    fn active_window(&self) -> Result<Option<Window>, ResolverError> {
        let reply = xproto::get_property(
            &*self.conn,
            false,
            self.root,
            self.net_active_window,
            xproto::AtomEnum::WINDOW,
            0,
            1,
        )
        .map_err(|e| ResolverError::Input(format!("get_property _NET_ACTIVE_WINDOW: {e}")))?
        .reply()
        .map_err(|e| ResolverError::Input(format!("get_property reply: {e}")))?;

        let window = reply.value32().and_then(|mut values| values.next());
        Ok(window.filter(|&w| w != 0))
    }

    /// Round-trip to the server so queued requests are processed before
    /// the caller continues.
    fn sync(&self) -> Result<(), ResolverError> {
        xproto::get_input_focus(&*self.conn)
            .map_err(|e| ResolverError::Input(format!("get_input_focus: {e}")))?
            .reply()
            .map_err(|e| ResolverError::Input(format!("get_input_focus reply: {e}")))?;
        Ok(())
    }

    fn fake_key(&self, event_type: u8, keycode: u8) -> Result<(), ResolverError> {
        xtest::fake_input(
            &*self.conn,
            event_type,
            keycode,
            x11rb::CURRENT_TIME,
            self.root,
            0,
            0,
            0,
        )
        .map_err(|e| ResolverError::Input(format!("fake_input: {e}")))?;
        Ok(())
    }

    fn query_keymap(&self) -> Result<[u8; 32], ResolverError> {
        Ok(xproto::query_keymap(&*self.conn)
            .map_err(|e| ResolverError::Input(format!("query_keymap: {e}")))?
            .reply()
            .map_err(|e| ResolverError::Input(format!("query_keymap reply: {e}")))?
            .keys)
    }

    /// Keycodes of the modifier map, one row per modifier.
    fn modifier_rows(&self) -> Result<Vec<Vec<u8>>, ResolverError> {
        let modmap = xproto::get_modifier_mapping(&*self.conn)
            .map_err(|e| ResolverError::Input(format!("get_modifier_mapping: {e}")))?
            .reply()
            .map_err(|e| ResolverError::Input(format!("get_modifier_mapping reply: {e}")))?;

        let per_row = modmap.keycodes_per_modifier() as usize;
        if per_row == 0 {
            return Ok(Vec::new());
        }
        Ok(modmap
            .keycodes
            .chunks(per_row)
            .map(|row| row.iter().copied().filter(|&kc| kc != 0).collect())
            .collect())
    }

    /// Release every modifier key that is physically held, so the
    /// hotkey's own modifiers do not combine with the injected Ctrl+C.
    fn release_held_modifiers(&self) -> Result<(), ResolverError> {
        let keymap = self.query_keymap()?;
        for (row, keycodes) in self.modifier_rows()?.iter().enumerate() {
            if row == LOCK_ROW {
                continue;
            }
            for &keycode in keycodes.iter().filter(|&&kc| is_down(&keymap, kc)) {
                self.fake_key(xproto::KEY_RELEASE_EVENT, keycode)?;
            }
        }
        Ok(())
    }
}

fn is_down(keymap: &[u8; 32], keycode: u8) -> bool {
    keymap[usize::from(keycode / 8)] & (1 << (keycode % 8)) != 0
}

/// First held keycode that is not a modifier, if any.
fn held_non_modifier(keymap: &[u8; 32], modifiers: &[u8]) -> Option<u8> {
    (8..=u8::MAX).find(|&kc| is_down(keymap, kc) && !modifiers.contains(&kc))
}

impl KeyInjector for X11KeyInjector {
    fn focus_foreground(&self) -> Result<(), ResolverError> {
        let Some(window) = self.active_window()? else {
            tracing::debug!("no active window to focus");
            return Ok(());
        };

        let request = ClientMessageEvent::new(
            32,
            window,
            self.net_active_window,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        xproto::send_event(
            &*self.conn,
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            request,
        )
        .map_err(|e| ResolverError::Input(format!("send_event _NET_ACTIVE_WINDOW: {e}")))?;

        xproto::set_input_focus(&*self.conn, InputFocus::PARENT, window, x11rb::CURRENT_TIME)
            .map_err(|e| ResolverError::Input(format!("set_input_focus: {e}")))?;

        self.sync()?;
        tracing::trace!(window, "focused foreground window");
        Ok(())
    }

    fn await_key_release(&self, timeout: Duration) -> Result<(), ResolverError> {
        // The passive grab that delivered the hotkey stays active until
        // its key goes up; events injected before that reach the grab,
        // not the focused window.
        let modifiers: Vec<u8> = self.modifier_rows()?.into_iter().flatten().collect();
        let deadline = Instant::now() + timeout;
        loop {
            let Some(keycode) = held_non_modifier(&self.query_keymap()?, &modifiers) else {
                return Ok(());
            };
            if Instant::now() >= deadline {
                return Err(ResolverError::Input(format!(
                    "keycode {keycode} still held after {}ms",
                    timeout.as_millis()
                )));
            }
            std::thread::sleep(RELEASE_POLL_INTERVAL);
        }
    }

    fn send_copy(&self) -> Result<(), ResolverError> {
        if !self.xtest {
            return Err(ResolverError::Input("XTEST extension unavailable".into()));
        }

        let setup = self.conn.setup();
        let ctrl = keysym_to_keycode(&*self.conn, setup, XK_CONTROL_L)
            .ok_or_else(|| ResolverError::Input("Control_L is not mapped".into()))?;
        let c = keysym_to_keycode(&*self.conn, setup, XK_C)
            .ok_or_else(|| ResolverError::Input("'c' is not mapped".into()))?;

        self.release_held_modifiers()?;
        self.fake_key(xproto::KEY_PRESS_EVENT, ctrl)?;
        self.fake_key(xproto::KEY_PRESS_EVENT, c)?;
        self.fake_key(xproto::KEY_RELEASE_EVENT, c)?;
        self.fake_key(xproto::KEY_RELEASE_EVENT, ctrl)?;
        self.sync()
    }
}
