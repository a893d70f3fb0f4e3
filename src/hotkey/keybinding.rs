//! Key binding resolution: normalized [`Hotkey`] → (modifier mask, keycode).
//!
//! Maps the platform-neutral hotkey model onto X11 modifier masks and
//! keycodes, and matches incoming key events against grabbed bindings.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{self, Keysym, ModMask, Setup};

use crate::engine::hotkey::{Hotkey, Modifiers};
use crate::resolver::ResolverError;

/// A resolved key binding ready for X11 grab registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// X11 modifier mask (e.g., Control | Mod1).
    pub modifiers: u16,
    /// X11 keycode for the key.
    pub keycode: u8,
    /// X11 keysym for display/logging.
    pub keysym: Keysym,
    /// Normalized hotkey string.
    pub raw: String,
}

/// Resolve a normalized hotkey into an X11 binding using the server's
/// keyboard mapping.
pub fn resolve_binding(
    hotkey: &Hotkey,
    conn: &impl Connection,
    setup: &Setup,
) -> Result<Binding, ResolverError> {
    let keysym = key_name_to_keysym(&hotkey.key)
        .ok_or_else(|| ResolverError::Hotkey(format!("unknown key: {:?}", hotkey.key)))?;

    let keycode = keysym_to_keycode(conn, setup, keysym).ok_or_else(|| {
        ResolverError::Hotkey(format!(
            "keysym 0x{keysym:04x} not found in keyboard mapping"
        ))
    })?;

    Ok(Binding {
        modifiers: modifier_mask(&hotkey.modifiers),
        keycode,
        keysym,
        raw: hotkey.to_string(),
    })
}

/// Convert modifier flags to X11 modifier mask bits.
///
/// Alt is Mod1 and Meta (Super) is Mod4 under the default xmodmap.
pub fn modifier_mask(modifiers: &Modifiers) -> u16 {
    let mut mask = 0u16;
    if modifiers.ctrl {
        mask |= u16::from(ModMask::CONTROL);
    }
    if modifiers.alt {
        mask |= u16::from(ModMask::M1);
    }
    if modifiers.shift {
        mask |= u16::from(ModMask::SHIFT);
    }
    if modifiers.meta {
        mask |= u16::from(ModMask::M4);
    }
    mask
}

/// Map a canonical key name (see [`crate::engine::hotkey`]) to an X11
/// keysym.
fn key_name_to_keysym(name: &str) -> Option<Keysym> {
    // Single printable ASCII character → Latin-1 keysym (lowercase for
    // letters, the character code otherwise).
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next())
        && ch.is_ascii_graphic()
    {
        return Some(ch.to_ascii_lowercase() as Keysym);
    }

    // Function keys. XK_F1 = 0xffbe; F1..F35 are contiguous.
    if let Some(rest) = name.strip_prefix('F')
        && let Ok(n) = rest.parse::<u32>()
        && (1..=24).contains(&n)
    {
        return Some(0xffbe + n - 1);
    }

    match name {
        "Space" => Some(0x0020),
        "Enter" => Some(0xff0d),
        "Escape" => Some(0xff1b),
        "Tab" => Some(0xff09),
        "Backspace" => Some(0xff08),
        "Delete" => Some(0xffff),
        "Insert" => Some(0xff63),
        "Home" => Some(0xff50),
        "End" => Some(0xff57),
        "PageUp" => Some(0xff55),
        "PageDown" => Some(0xff56),
        "Up" => Some(0xff52),
        "Down" => Some(0xff54),
        "Left" => Some(0xff51),
        "Right" => Some(0xff53),
        _ => None,
    }
}

/// Resolve a keysym to a keycode using the server's keyboard mapping.
///
/// Returns the first matching keycode, or `None` if the keysym is
/// not present in any keycode's keysym list.
pub fn keysym_to_keycode(conn: &impl Connection, setup: &Setup, keysym: Keysym) -> Option<u8> {
    keycodes_for_keysym(conn, setup, keysym).into_iter().next()
}

/// All keycodes whose keysym list contains `keysym`, in keycode order.
/// Empty if the mapping query fails.
pub fn keycodes_for_keysym(conn: &impl Connection, setup: &Setup, keysym: Keysym) -> Vec<u8> {
    let min_keycode = setup.min_keycode;
    let max_keycode = setup.max_keycode;
    let count = max_keycode - min_keycode + 1;

    let Some(reply) = xproto::get_keyboard_mapping(conn, min_keycode, count)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
    else {
        return Vec::new();
    };

    let syms_per_code = reply.keysyms_per_keycode as usize;
    if syms_per_code == 0 {
        return Vec::new();
    }

    reply
        .keysyms
        .chunks(syms_per_code)
        .enumerate()
        .filter(|(_, syms)| syms.contains(&keysym))
        .map(|(i, _)| min_keycode + i as u8)
        .collect()
}

/// Check if a key event matches a binding.
///
/// Masks out CapsLock (LockMask) and NumLock from the event state
/// before comparing, so hotkeys fire regardless of lock key state.
///
/// `numlock_mask` is the dynamically detected modifier bit for NumLock
/// (usually Mod2 / 0x0010, but may differ per X11 server configuration).
pub fn event_matches_binding(
    event_keycode: u8,
    event_state: u16,
    binding: &Binding,
    numlock_mask: u16,
) -> bool {
    let lock_mask: u16 = u16::from(ModMask::LOCK) | numlock_mask;
    let clean_state = event_state & !lock_mask;
    // Mouse button bits (8-12) are not part of the chord.
    let modifier_mask: u16 = 0x00ff;
    let clean_mods = clean_state & modifier_mask;

    event_keycode == binding.keycode && clean_mods == binding.modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_alt_s() -> Binding {
        Binding {
            modifiers: u16::from(ModMask::CONTROL) | u16::from(ModMask::M1),
            keycode: 39,
            keysym: 0x73,
            raw: "Ctrl+Alt+S".into(),
        }
    }

    #[test]
    fn modifier_mask_maps_each_flag() {
        let all = Modifiers {
            ctrl: true,
            alt: true,
            shift: true,
            meta: true,
        };
        let expected = u16::from(ModMask::CONTROL)
            | u16::from(ModMask::M1)
            | u16::from(ModMask::SHIFT)
            | u16::from(ModMask::M4);
        assert_eq!(modifier_mask(&all), expected);
        assert_eq!(modifier_mask(&Modifiers::default()), 0);
    }

    #[test]
    fn key_name_letters_and_digits() {
        assert_eq!(key_name_to_keysym("S"), Some(0x73)); // 's'
        assert_eq!(key_name_to_keysym("C"), Some(0x63)); // 'c'
        assert_eq!(key_name_to_keysym("0"), Some(0x30));
        assert_eq!(key_name_to_keysym("9"), Some(0x39));
    }

    #[test]
    fn key_name_punctuation() {
        assert_eq!(key_name_to_keysym("/"), Some(0x2f));
        assert_eq!(key_name_to_keysym("`"), Some(0x60));
        assert_eq!(key_name_to_keysym("["), Some(0x5b));
    }

    #[test]
    fn key_name_function_keys() {
        assert_eq!(key_name_to_keysym("F1"), Some(0xffbe));
        assert_eq!(key_name_to_keysym("F12"), Some(0xffc9));
        assert_eq!(key_name_to_keysym("F24"), Some(0xffd5));
        assert_eq!(key_name_to_keysym("F25"), None);
    }

    #[test]
    fn key_name_named_keys() {
        assert_eq!(key_name_to_keysym("Space"), Some(0x0020));
        assert_eq!(key_name_to_keysym("Enter"), Some(0xff0d));
        assert_eq!(key_name_to_keysym("Escape"), Some(0xff1b));
        assert_eq!(key_name_to_keysym("PageDown"), Some(0xff56));
        assert_eq!(key_name_to_keysym("Hyper"), None);
    }

    #[test]
    fn every_parseable_hotkey_key_has_a_keysym() {
        for spec in [
            "Ctrl+A", "Ctrl+Z", "Ctrl+5", "Ctrl+F7", "Ctrl+Space", "Ctrl+Return", "Ctrl+Esc",
            "Ctrl+Tab", "Ctrl+Backspace", "Ctrl+Del", "Ctrl+Insert", "Ctrl+Home", "Ctrl+End",
            "Ctrl+PageUp", "Ctrl+Next", "Ctrl+Up", "Ctrl+Down", "Ctrl+Left", "Ctrl+Right",
            "Ctrl+minus", "Ctrl+grave",
        ] {
            let hotkey: Hotkey = spec.parse().unwrap();
            assert!(
                key_name_to_keysym(&hotkey.key).is_some(),
                "no keysym for {spec}"
            );
        }
    }

    #[test]
    fn event_matches_with_lock_bits() {
        let binding = ctrl_alt_s();
        let numlock = u16::from(ModMask::M2);

        assert!(event_matches_binding(39, binding.modifiers, &binding, numlock));

        let with_caps = binding.modifiers | u16::from(ModMask::LOCK);
        assert!(event_matches_binding(39, with_caps, &binding, numlock));

        let with_both = binding.modifiers | u16::from(ModMask::LOCK) | numlock;
        assert!(event_matches_binding(39, with_both, &binding, numlock));
    }

    #[test]
    fn event_no_match_wrong_keycode_or_modifiers() {
        let binding = ctrl_alt_s();
        let numlock = u16::from(ModMask::M2);
        assert!(!event_matches_binding(40, binding.modifiers, &binding, numlock));
        assert!(!event_matches_binding(
            39,
            u16::from(ModMask::CONTROL),
            &binding,
            numlock
        ));
    }

    #[test]
    fn event_respects_custom_numlock_mask() {
        let binding = ctrl_alt_s();
        let custom_numlock = u16::from(ModMask::M3);
        assert!(event_matches_binding(
            39,
            binding.modifiers | custom_numlock,
            &binding,
            custom_numlock
        ));
        // Mod2 is a real modifier when NumLock lives on Mod3.
        assert!(!event_matches_binding(
            39,
            binding.modifiers | u16::from(ModMask::M2),
            &binding,
            custom_numlock
        ));
    }

    #[test]
    fn event_ignores_mouse_buttons() {
        let binding = ctrl_alt_s();
        assert!(event_matches_binding(
            39,
            binding.modifiers | 0x100,
            &binding,
            u16::from(ModMask::M2)
        ));
    }
}
