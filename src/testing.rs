//! In-memory resolver fakes shared by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::hotkey::Hotkey;
use crate::feedback::{FeedbackSink, NotifyKind};
use crate::hotkey::keybinding::{Binding, modifier_mask};
use crate::hotkey::x11::KeyPress;
use crate::resolver::{
    ClipboardProvider, HotkeyBackend, KeyInjector, ResolverError, SelectionSource, UrlOpener,
};

/// Clipboard held in memory. Text can be scheduled to appear after a
/// number of reads, emulating an application that copies slowly.
#[derive(Default)]
pub struct MockClipboard {
    contents: Mutex<String>,
    scheduled: Mutex<Option<(usize, String)>>,
    fail_reads: AtomicBool,
    pub reads: AtomicUsize,
    pub writes: Mutex<Vec<String>>,
}

impl MockClipboard {
    pub fn with_text(text: &str) -> Arc<Self> {
        let clipboard = Self::default();
        *clipboard.contents.lock().unwrap() = text.to_string();
        Arc::new(clipboard)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn text(&self) -> String {
        self.contents.lock().unwrap().clone()
    }

    /// Make `text` the clipboard content on the read after `after` more
    /// reads.
    pub fn schedule(&self, after: usize, text: &str) {
        *self.scheduled.lock().unwrap() = Some((after, text.to_string()));
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ClipboardProvider for MockClipboard {
    fn read_text(&self) -> Result<String, ResolverError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ResolverError::Clipboard("mock read failure".into()));
        }

        let mut scheduled = self.scheduled.lock().unwrap();
        if let Some((remaining, text)) = scheduled.take() {
            if remaining == 0 {
                *self.contents.lock().unwrap() = text;
            } else {
                *scheduled = Some((remaining - 1, text));
            }
        }
        Ok(self.text())
    }

    fn write_text(&self, text: &str) -> Result<(), ResolverError> {
        self.writes.lock().unwrap().push(text.to_string());
        *self.contents.lock().unwrap() = text.to_string();
        Ok(())
    }
}

/// Key injector whose copy command schedules text on a [`MockClipboard`].
pub struct MockInjector {
    clipboard: Arc<MockClipboard>,
    /// Text the focused control "copies", and after how many reads it
    /// lands. `None` means the application ignores the copy command.
    copies: Option<(usize, String)>,
    fail_copy: bool,
    keys_held: AtomicBool,
    log: Mutex<Vec<&'static str>>,
    pub focus_calls: AtomicUsize,
    pub copy_calls: AtomicUsize,
}

impl MockInjector {
    pub fn new(clipboard: Arc<MockClipboard>, copies: Option<(usize, &str)>) -> Arc<Self> {
        Arc::new(Self::build(
            clipboard,
            copies.map(|(after, text)| (after, text.to_string())),
            false,
        ))
    }

    /// Injector whose `send_copy` fails (no XTEST).
    pub fn failing(clipboard: Arc<MockClipboard>) -> Arc<Self> {
        Arc::new(Self::build(clipboard, None, true))
    }

    fn build(clipboard: Arc<MockClipboard>, copies: Option<(usize, String)>, fail_copy: bool) -> Self {
        Self {
            clipboard,
            copies,
            fail_copy,
            keys_held: AtomicBool::new(false),
            log: Mutex::default(),
            focus_calls: AtomicUsize::new(0),
            copy_calls: AtomicUsize::new(0),
        }
    }

    /// Keep the hotkey's key down for good: `await_key_release` fails.
    pub fn hold_keys(&self) {
        self.keys_held.store(true, Ordering::SeqCst);
    }

    pub fn copy_count(&self) -> usize {
        self.copy_calls.load(Ordering::SeqCst)
    }

    pub fn focus_count(&self) -> usize {
        self.focus_calls.load(Ordering::SeqCst)
    }

    /// Injector calls in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

impl KeyInjector for MockInjector {
    fn await_key_release(&self, _timeout: Duration) -> Result<(), ResolverError> {
        self.log.lock().unwrap().push("await_key_release");
        if self.keys_held.load(Ordering::SeqCst) {
            return Err(ResolverError::Input("key still held".into()));
        }
        Ok(())
    }

    fn focus_foreground(&self) -> Result<(), ResolverError> {
        self.log.lock().unwrap().push("focus");
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn send_copy(&self) -> Result<(), ResolverError> {
        self.log.lock().unwrap().push("copy");
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_copy {
            return Err(ResolverError::Input("mock injection failure".into()));
        }
        if let Some((after, text)) = &self.copies {
            self.clipboard.schedule(*after, text);
        }
        Ok(())
    }
}

/// Selection source returning a fixed value.
pub struct MockSelection {
    text: Option<String>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl MockSelection {
    pub fn new(text: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            text: text.map(str::to_string),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: None,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SelectionSource for MockSelection {
    fn selected_text(&self) -> Result<Option<String>, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ResolverError::Selection("mock selection failure".into()));
        }
        Ok(self.text.clone())
    }
}

/// URL opener that records every URL.
#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            opened: Mutex::default(),
            fail: true,
        })
    }

    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), ResolverError> {
        if self.fail {
            return Err(ResolverError::Open("no handler".into()));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Feedback sink that records every notification.
#[derive(Default)]
pub struct RecordingFeedback {
    pub notes: Mutex<Vec<(NotifyKind, String, String)>>,
}

impl RecordingFeedback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notes(&self) -> Vec<(NotifyKind, String, String)> {
        self.notes.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotifyKind> {
        self.notes().into_iter().map(|(kind, _, _)| kind).collect()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn notify(&self, kind: NotifyKind, title: &str, body: &str) {
        self.notes
            .lock()
            .unwrap()
            .push((kind, title.to_string(), body.to_string()));
    }
}

#[derive(Default)]
struct BackendState {
    grabs: usize,
    ungrabs: usize,
    active: HashSet<(u16, u8)>,
    fail: HashSet<String>,
}

/// Hotkey backend that tracks grabs in memory. Clones share state.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    pub const NUMLOCK: u16 = 0x0010;

    pub fn new() -> Self {
        Self::default()
    }

    /// Make grabs of the normalized `hotkey` fail, as if another client
    /// held it.
    pub fn fail_on(&self, hotkey: &str) {
        self.state.lock().unwrap().fail.insert(hotkey.to_string());
    }

    pub fn grab_count(&self) -> usize {
        self.state.lock().unwrap().grabs
    }

    pub fn ungrab_count(&self) -> usize {
        self.state.lock().unwrap().ungrabs
    }

    pub fn active_grabs(&self) -> usize {
        self.state.lock().unwrap().active.len()
    }

    /// The event a press of `hotkey` produces under this backend.
    pub fn press(hotkey: &str) -> KeyPress {
        let hotkey: Hotkey = hotkey.parse().unwrap();
        KeyPress {
            keycode: Self::keycode(&hotkey.key),
            state: modifier_mask(&hotkey.modifiers),
        }
    }

    fn keycode(key: &str) -> u8 {
        key.bytes().fold(8u8, |acc, b| acc.wrapping_add(b))
    }
}

impl HotkeyBackend for MockBackend {
    fn grab(&mut self, hotkey: &Hotkey) -> Result<Binding, ResolverError> {
        let raw = hotkey.to_string();
        let mut state = self.state.lock().unwrap();
        if state.fail.contains(&raw) {
            return Err(ResolverError::Hotkey(format!("{raw} is claimed")));
        }

        let keycode = Self::keycode(&hotkey.key);
        let binding = Binding {
            modifiers: modifier_mask(&hotkey.modifiers),
            keycode,
            keysym: 0,
            raw,
        };
        state.grabs += 1;
        state.active.insert((binding.modifiers, binding.keycode));
        Ok(binding)
    }

    fn ungrab(&mut self, binding: &Binding) {
        let mut state = self.state.lock().unwrap();
        state.ungrabs += 1;
        state.active.remove(&(binding.modifiers, binding.keycode));
    }

    fn lock_mask(&self) -> u16 {
        Self::NUMLOCK
    }
}
