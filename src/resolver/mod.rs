//! Resolver abstraction: pluggable platform adapters.
//!
//! Extracts all platform-specific behavior (key grabs, clipboard access,
//! input injection, selection queries, URL launching) into small traits.
//! The X11 adapters implement them for the daemon; tests substitute
//! in-memory fakes.

pub mod clipboard;
pub mod hotkey;
pub mod input;
pub mod opener;
pub mod x11;

pub use clipboard::ClipboardProvider;
pub use hotkey::HotkeyBackend;
pub use input::{KeyInjector, SelectionSource};
pub use opener::{SystemOpener, UrlOpener};

/// Errors returned by resolver adapters.
///
/// Every variant is an OS-boundary failure. Callers in the capture
/// chain and dispatcher absorb them; none is fatal to the daemon.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// Display connection or extension setup failed.
    #[error("display: {0}")]
    Display(String),

    /// Hotkey registration failed (grab conflict, unmapped key).
    #[error("hotkey: {0}")]
    Hotkey(String),

    /// Clipboard operation failed (e.g. xclip not found, pipe error).
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// Focus query or synthetic input failed.
    #[error("input: {0}")]
    Input(String),

    /// Direct selection query failed.
    #[error("selection: {0}")]
    Selection(String),

    /// Handing a URL to the default handler failed.
    #[error("open: {0}")]
    Open(String),
}
