//! Feedback sink: short-lived, non-blocking user notifications.
//!
//! Every dispatch ends in exactly one notification: success, guidance,
//! or error. Sinks must return immediately; display and auto-dismiss
//! happen elsewhere.

pub mod desktop;

pub use desktop::DesktopNotifier;

use std::time::Duration;

use notify_rust::Urgency;

/// How long a notification stays on screen.
pub const DEFAULT_DISPLAY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Outcome class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Guidance,
    Error,
}

impl NotifyKind {
    /// freedesktop urgency level.
    pub fn urgency(self) -> Urgency {
        match self {
            NotifyKind::Success => Urgency::Low,
            NotifyKind::Guidance => Urgency::Normal,
            NotifyKind::Error => Urgency::Critical,
        }
    }
}

/// Fire-and-forget notification surface.
pub trait FeedbackSink: Send + Sync {
    /// Show a notification. Never blocks and never fails; an unavailable
    /// facility degrades to a log line.
    fn notify(&self, kind: NotifyKind, title: &str, body: &str);
}

/// Writes notifications to the log only (`--no-notify`).
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn notify(&self, kind: NotifyKind, title: &str, body: &str) {
        log_notification(kind, title, body);
    }
}

pub(crate) fn log_notification(kind: NotifyKind, title: &str, body: &str) {
    match kind {
        NotifyKind::Success => tracing::info!(title, body, "notification"),
        NotifyKind::Guidance => tracing::warn!(title, body, "notification"),
        NotifyKind::Error => tracing::error!(title, body, "notification"),
    }
}
