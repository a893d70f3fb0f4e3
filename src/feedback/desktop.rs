//! Desktop notifications over the freedesktop notification service,
//! closed through their handle once the display timeout elapses.

use std::sync::Arc;
use std::time::Duration;

use notify_rust::{Notification, NotificationHandle, Timeout};
use tokio::runtime::Handle;

use super::{FeedbackSink, NotifyKind, log_notification};

const APP_NAME: &str = "snipsearch";

/// A notification service could not show a notification.
#[derive(Debug, thiserror::Error)]
#[error("notification: {0}")]
pub struct NotifyError(String);

/// Shows notifications and closes them again.
pub trait NotificationServer: Send + Sync + 'static {
    /// A notification on screen.
    type Shown;

    fn show(
        &self,
        kind: NotifyKind,
        title: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<Self::Shown, NotifyError>;

    fn close(&self, shown: Self::Shown);
}

/// The session's freedesktop notification daemon, via `notify-rust`.
pub struct Freedesktop;

impl NotificationServer for Freedesktop {
    type Shown = NotificationHandle;

    fn show(
        &self,
        kind: NotifyKind,
        title: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<NotificationHandle, NotifyError> {
        let expire_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(body)
            .urgency(kind.urgency())
            .timeout(Timeout::Milliseconds(expire_ms))
            .show()
            .map_err(|e| NotifyError(e.to_string()))
    }

    fn close(&self, shown: NotificationHandle) {
        shown.close();
    }
}

/// Shows notifications without blocking the caller.
///
/// Each notification is shown, held for the display timeout, and closed
/// on the runtime's blocking pool, so `notify` may be called from
/// dispatch threads. Closing does not rely on the server honoring the
/// expire hint. A failed `show` degrades to a log line.
pub struct DesktopNotifier<S: NotificationServer = Freedesktop> {
    handle: Handle,
    timeout: Duration,
    server: Arc<S>,
}

impl DesktopNotifier {
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        Self::with_server(handle, timeout, Freedesktop)
    }
}

impl<S: NotificationServer> DesktopNotifier<S> {
    pub fn with_server(handle: Handle, timeout: Duration, server: S) -> Self {
        Self {
            handle,
            timeout,
            server: Arc::new(server),
        }
    }
}

impl<S: NotificationServer> FeedbackSink for DesktopNotifier<S> {
    fn notify(&self, kind: NotifyKind, title: &str, body: &str) {
        let title = title.to_owned();
        let body = body.to_owned();
        let timeout = self.timeout;
        let server = Arc::clone(&self.server);

        self.handle.spawn_blocking(move || {
            match server.show(kind, &title, &body, timeout) {
                Ok(shown) => {
                    std::thread::sleep(timeout);
                    server.close(shown);
                    tracing::trace!(title = %title, "notification closed");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "desktop notification failed");
                    log_notification(kind, &title, &body);
                }
            }
        });
    }
}
