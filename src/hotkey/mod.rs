//! Global hotkeys: binding resolution, the registry, and X11 event
//! plumbing.
//!
//! The daemon owns one [`HotkeyRegistry`] backed by the X11 grab
//! backend. Raw key events arrive on the thread spawned by
//! [`x11::spawn_event_thread`] and are matched with
//! [`HotkeyRegistry::resolve`].

pub mod keybinding;
pub mod registry;
pub mod x11;

pub use registry::{ActiveBinding, BindingConflict, HotkeyRegistry};
