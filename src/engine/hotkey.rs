//! Hotkey specification parser: "Ctrl+Alt+S" → normalized [`Hotkey`].
//!
//! Parsing is order-independent and case-insensitive. The normalized
//! string form is the identity of a binding: two specs name the same
//! physical combination iff their `Display` outputs are equal.

use std::fmt;
use std::str::FromStr;

/// Maximum number of keys in one combination (modifiers + key).
pub const MAX_KEYS: usize = 5;

/// Hotkey specification errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeySpecError {
    #[error("empty hotkey")]
    Empty,
    #[error("too many keys in {0:?} (max {MAX_KEYS})")]
    TooManyKeys(String),
    #[error("unknown key: {0:?}")]
    UnknownKey(String),
    #[error("no key in {0:?} (only modifiers)")]
    MissingKey(String),
    #[error("more than one key in {0:?}")]
    MultipleKeys(String),
    #[error("bare key without modifier: {0:?}")]
    NoModifier(String),
}

/// Modifier flags of a hotkey. `ctrl` also covers Cmd/CommandOrControl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.meta)
    }
}

/// A normalized global hotkey: modifier flags plus exactly one key.
///
/// `key` holds the canonical key name (upper-case letters, `F1`..`F24`,
/// title-case named keys, or a literal punctuation character).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Hotkey {
    /// Parse a user-provided spec. Blank input means "unbound".
    pub fn parse_optional(spec: &str) -> Result<Option<Self>, HotkeySpecError> {
        if spec.trim().is_empty() {
            return Ok(None);
        }
        spec.parse().map(Some)
    }
}

impl FromStr for Hotkey {
    type Err = HotkeySpecError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        if spec.trim().is_empty() {
            return Err(HotkeySpecError::Empty);
        }

        let parts: Vec<&str> = spec.split('+').map(str::trim).collect();
        if parts.len() > MAX_KEYS {
            return Err(HotkeySpecError::TooManyKeys(spec.to_string()));
        }

        let mut modifiers = Modifiers::default();
        let mut key: Option<String> = None;

        for part in parts {
            if apply_modifier(&mut modifiers, part) {
                continue;
            }
            let name =
                normalize_key(part).ok_or_else(|| HotkeySpecError::UnknownKey(part.to_string()))?;
            if key.as_ref().is_some_and(|existing| *existing != name) {
                return Err(HotkeySpecError::MultipleKeys(spec.to_string()));
            }
            key = Some(name);
        }

        let key = key.ok_or_else(|| HotkeySpecError::MissingKey(spec.to_string()))?;
        if modifiers.is_empty() {
            return Err(HotkeySpecError::NoModifier(spec.to_string()));
        }

        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (on, name) in [
            (m.ctrl, "Ctrl"),
            (m.alt, "Alt"),
            (m.shift, "Shift"),
            (m.meta, "Meta"),
        ] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        f.write_str(&self.key)
    }
}

/// Set the modifier flag named by `part`. Returns `false` if `part`
/// is not a modifier name.
fn apply_modifier(modifiers: &mut Modifiers, part: &str) -> bool {
    match part.to_ascii_lowercase().as_str() {
        "ctrl" | "control" | "cmd" | "command" | "commandorcontrol" | "cmdorctrl" => {
            modifiers.ctrl = true
        }
        "alt" | "option" | "mod1" => modifiers.alt = true,
        "shift" => modifiers.shift = true,
        "meta" | "super" | "win" | "mod4" => modifiers.meta = true,
        _ => return false,
    }
    true
}

/// Map a key name to its canonical form, or `None` if unknown.
fn normalize_key(name: &str) -> Option<String> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return Some(ch.to_ascii_uppercase().to_string());
        }
        if ch.is_ascii_digit() || "-=[];',./\\`".contains(ch) {
            return Some(ch.to_string());
        }
        return None;
    }

    if let Some(rest) = name.strip_prefix('F').or_else(|| name.strip_prefix('f'))
        && let Ok(n) = rest.parse::<u32>()
        && (1..=24).contains(&n)
    {
        return Some(format!("F{n}"));
    }

    let canonical = match name.to_ascii_lowercase().as_str() {
        "space" => "Space",
        "return" | "enter" => "Enter",
        "escape" | "esc" => "Escape",
        "tab" => "Tab",
        "backspace" => "Backspace",
        "delete" | "del" => "Delete",
        "insert" | "ins" => "Insert",
        "home" => "Home",
        "end" => "End",
        "page_up" | "pageup" | "prior" => "PageUp",
        "page_down" | "pagedown" | "next" => "PageDown",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "minus" => "-",
        "equal" | "equals" => "=",
        "bracketleft" => "[",
        "bracketright" => "]",
        "semicolon" => ";",
        "quote" | "apostrophe" => "'",
        "comma" => ",",
        "period" => ".",
        "slash" => "/",
        "backslash" => "\\",
        "grave" | "backquote" => "`",
        _ => return None,
    };
    Some(canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str) -> Hotkey {
        spec.parse().unwrap()
    }

    #[test]
    fn normalizes_modifier_order() {
        assert_eq!(parse("Shift+Alt+Ctrl+s").to_string(), "Ctrl+Alt+Shift+S");
        assert_eq!(parse("Ctrl+Alt+S"), parse("alt+ctrl+s"));
    }

    #[test]
    fn modifier_aliases() {
        assert_eq!(parse("CommandOrControl+Alt+S"), parse("Ctrl+Alt+S"));
        assert_eq!(parse("Super+Q").to_string(), "Meta+Q");
        assert_eq!(parse("Control+Option+1").to_string(), "Ctrl+Alt+1");
    }

    #[test]
    fn key_order_independent() {
        assert_eq!(parse("S+Ctrl").to_string(), "Ctrl+S");
    }

    #[test]
    fn named_and_function_keys() {
        assert_eq!(parse("ctrl+space").key, "Space");
        assert_eq!(parse("Alt+return").key, "Enter");
        assert_eq!(parse("Ctrl+f12").key, "F12");
        assert_eq!(parse("Ctrl+F24").key, "F24");
        assert_eq!(parse("Ctrl+slash").key, "/");
        assert_eq!(parse("Ctrl+/").key, "/");
    }

    #[test]
    fn duplicate_key_collapses() {
        // Editor recordings may repeat the main key.
        assert_eq!(parse("Ctrl+S+s").to_string(), "Ctrl+S");
    }

    #[test]
    fn rejects_bad_specs() {
        assert_eq!("".parse::<Hotkey>(), Err(HotkeySpecError::Empty));
        assert!(matches!(
            "Ctrl+Alt".parse::<Hotkey>(),
            Err(HotkeySpecError::MissingKey(_))
        ));
        assert!(matches!(
            "S".parse::<Hotkey>(),
            Err(HotkeySpecError::NoModifier(_))
        ));
        assert!(matches!(
            "Ctrl+A+B".parse::<Hotkey>(),
            Err(HotkeySpecError::MultipleKeys(_))
        ));
        assert!(matches!(
            "Ctrl+Hyper".parse::<Hotkey>(),
            Err(HotkeySpecError::UnknownKey(_))
        ));
        assert!(matches!(
            "Ctrl+F25".parse::<Hotkey>(),
            Err(HotkeySpecError::UnknownKey(_))
        ));
        assert!(matches!(
            "Ctrl+Alt+Shift+Meta+Ctrl+S".parse::<Hotkey>(),
            Err(HotkeySpecError::TooManyKeys(_))
        ));
    }

    #[test]
    fn blank_spec_is_unbound() {
        assert_eq!(Hotkey::parse_optional(""), Ok(None));
        assert_eq!(Hotkey::parse_optional("   "), Ok(None));
        assert!(Hotkey::parse_optional("Ctrl+K").unwrap().is_some());
    }
}
