//! Daemon: hotkey registration, dispatch, and the editor socket.
//!
//! Architecture: channel-based actor. A single loop owns all mutable
//! state ([`handler::DaemonState`]): the engine store handle, settings,
//! and the hotkey registry. Key presses arrive from the X11 event
//! thread; editor requests arrive from per-connection tasks over an
//! mpsc channel. Dispatches run on the blocking pool so the loop keeps
//! serving while a capture waits on the clipboard.

mod connection;
pub mod handler;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};

use connection::DaemonCommand;
use handler::{Autostart, DaemonState, Handled};

use crate::capture::{CaptureChain, CaptureConfig, ClipboardGuard};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::engine::store::{EngineStore, StoreError};
use crate::feedback::{DesktopNotifier, FeedbackSink, LogSink, NotifyKind};
use crate::hotkey::HotkeyRegistry;
use crate::hotkey::x11::{KeyPress, spawn_event_thread};
use crate::ipc::protocol::{ConflictDescriptor, Message};
use crate::resolver::x11::X11Shared;
use crate::resolver::x11::clipboard::{PrimarySelection, X11ClipboardProvider};
use crate::resolver::x11::hotkey::X11HotkeyBackend;
use crate::resolver::x11::input::X11KeyInjector;
use crate::resolver::{ClipboardProvider, HotkeyBackend, ResolverError, SystemOpener};
use crate::settings::{APP_DIR, SettingsStore};

/// File names under the config directory.
const ENGINES_FILE: &str = "engines.json";
const SETTINGS_FILE: &str = "settings.json";
const SOCKET_FILE: &str = "daemon.sock";

/// Daemon startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("$XDG_RUNTIME_DIR is not set")]
    NoRuntimeDir,
    #[error("daemon already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("socket path {0} has no parent directory")]
    BadSocketPath(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error("X11 event thread exited")]
    EventThreadGone,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime configuration from the `daemon` subcommand.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub config_dir: PathBuf,
    pub capture: CaptureConfig,
    pub notify_timeout: Duration,
    /// `false` sends notifications to the log only.
    pub notify: bool,
}

/// Run the daemon until SIGTERM or SIGINT.
///
/// Loads the engine store and settings, connects to X11, registers
/// hotkeys, and serves the editor socket. On shutdown every grab is
/// released and the socket file removed.
///
/// # Errors
///
/// Returns `DaemonError` if the stores cannot be loaded, the display
/// is unreachable, the socket cannot be bound, or another daemon is
/// already running.
pub async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    let socket_path = socket_path()?;

    let store = Arc::new(EngineStore::open(config.config_dir.join(ENGINES_FILE))?);
    let settings = SettingsStore::open(config.config_dir.join(SETTINGS_FILE))?;
    let x11 = X11Shared::connect()?;

    let feedback: Arc<dyn FeedbackSink> = if config.notify {
        Arc::new(DesktopNotifier::new(
            tokio::runtime::Handle::current(),
            config.notify_timeout,
        ))
    } else {
        Arc::new(LogSink)
    };

    let clipboard: Arc<dyn ClipboardProvider> = Arc::new(X11ClipboardProvider::new());
    let chain = CaptureChain::standard(
        Arc::clone(&clipboard),
        Arc::new(X11KeyInjector::new(&x11)),
        Arc::new(PrimarySelection::new()),
        &config.capture,
    );
    tracing::debug!(
        strategies = ?chain.strategy_names(),
        max_wait_ms = config.capture.max_wait().as_millis() as u64,
        "capture chain ready"
    );
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store),
        ClipboardGuard::new(clipboard),
        chain,
        Arc::new(SystemOpener),
        Arc::clone(&feedback),
    ));

    let mut state = DaemonState::new(
        store,
        settings,
        HotkeyRegistry::new(X11HotkeyBackend::new(&x11)),
        Autostart::detect(),
    );
    state.sync_autostart();
    let conflicts = state.reconcile();
    report_conflicts(feedback.as_ref(), &conflicts);

    let listener = bind_socket(&socket_path).await?;
    tracing::info!(
        path = %socket_path.display(),
        bindings = state.registry.bindings().len(),
        "daemon listening"
    );

    let stop = Arc::new(AtomicBool::new(false));
    let (keys, event_thread) = spawn_event_thread(Arc::clone(&x11.conn), Arc::clone(&stop))?;

    let result = serve(listener, &mut state, dispatcher, keys, shutdown_signal()?).await;

    // Cleanup: release grabs, stop the event thread, remove the socket.
    state.registry.unregister_all();
    stop.store(true, Ordering::Relaxed);
    if event_thread.join().is_err() {
        tracing::warn!("X11 event thread panicked");
    }
    if let Err(e) = std::fs::remove_file(&socket_path) {
        tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove socket");
    }

    tracing::info!("daemon stopped");
    result
}

/// The daemon loop. Returns when `shutdown` resolves or the key event
/// source closes.
async fn serve<B: HotkeyBackend>(
    listener: UnixListener,
    state: &mut DaemonState<B>,
    dispatcher: Arc<Dispatcher>,
    mut keys: mpsc::UnboundedReceiver<KeyPress>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), DaemonError> {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<DaemonCommand>();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // -- New connection --
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        connection::spawn_connection(stream, cmd_tx.clone());
                        tracing::debug!("accepted connection");
                    }
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                }
            }

            // -- Request from a connection task --
            Some(cmd) = cmd_rx.recv() => {
                match handler::handle_message(state, cmd.request) {
                    Handled::Reply(response) => {
                        let _ = cmd.response_tx.send(response);
                    }
                    Handled::Dispatch { id, engine_id } => {
                        spawn_dispatch(Arc::clone(&dispatcher), engine_id, Some((id, cmd.response_tx)));
                    }
                }
            }

            // -- Hotkey press --
            key = keys.recv() => {
                let Some(key) = key else {
                    return Err(DaemonError::EventThreadGone);
                };
                match state.registry.resolve(key.keycode, key.state) {
                    Some(engine_id) => {
                        tracing::debug!(engine_id, "hotkey activated");
                        spawn_dispatch(Arc::clone(&dispatcher), engine_id.to_string(), None);
                    }
                    None => tracing::trace!(?key, "key press matches no binding"),
                }
            }

            () = &mut shutdown => return Ok(()),
        }
    }
}

/// Run one dispatch on the blocking pool; answer `reply` with its outcome.
fn spawn_dispatch(
    dispatcher: Arc<Dispatcher>,
    engine_id: String,
    reply: Option<(u32, oneshot::Sender<Message>)>,
) {
    tokio::spawn(async move {
        let from_request = reply.is_some();
        let outcome = tokio::task::spawn_blocking(move || {
            if from_request {
                dispatcher.dispatch_request(&engine_id)
            } else {
                dispatcher.dispatch(&engine_id)
            }
        })
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "dispatch task failed");
                DispatchOutcome::Failed {
                    reason: "dispatch task failed".into(),
                }
            });
        if let Some((id, response_tx)) = reply {
            let _ = response_tx.send(handler::outcome_response(id, outcome));
        }
    });
}

/// Tell the user about hotkeys that could not be registered at startup.
fn report_conflicts(feedback: &dyn FeedbackSink, conflicts: &[ConflictDescriptor]) {
    match conflicts {
        [] => {}
        [one] => feedback.notify(
            NotifyKind::Error,
            "Hotkey unavailable",
            &format!("{} for {}: {}", one.hotkey, one.engine_name, one.reason),
        ),
        many => feedback.notify(
            NotifyKind::Error,
            "Hotkeys unavailable",
            &format!(
                "{} hotkeys could not be registered. Run `snipsearch bindings` for details.",
                many.len()
            ),
        ),
    }
}

/// Resolves on SIGTERM or SIGINT.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
    })
}

// -- Socket setup --

/// The daemon socket path under `$XDG_RUNTIME_DIR`.
pub fn socket_path() -> Result<PathBuf, DaemonError> {
    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
        .filter(|dir| !dir.is_empty())
        .ok_or(DaemonError::NoRuntimeDir)?;
    Ok(PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILE))
}

/// Create the socket directory and bind the Unix listener.
///
/// Handles stale socket detection: if EADDRINUSE, attempts to connect
/// to the existing socket. If the connection succeeds, another daemon
/// is running. If it fails, the socket is stale and is removed.
async fn bind_socket(path: &Path) -> Result<UnixListener, DaemonError> {
    let parent = path
        .parent()
        .ok_or_else(|| DaemonError::BadSocketPath(path.to_path_buf()))?;
    std::fs::create_dir_all(parent).map_err(|source| DaemonError::MkdirFailed {
        path: parent.to_path_buf(),
        source,
    })?;
    // Enforce 0700 even if the directory already existed.
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700)).map_err(
            |source| DaemonError::MkdirFailed {
                path: parent.to_path_buf(),
                source,
            },
        )?;
    }

    let bind_failed = |source: std::io::Error| DaemonError::BindFailed {
        path: path.to_path_buf(),
        source,
    };

    match UnixListener::bind(path) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(path).await.is_ok() {
                return Err(DaemonError::AlreadyRunning(path.to_path_buf()));
            }
            tracing::info!(path = %path.display(), "removing stale socket");
            std::fs::remove_file(path).map_err(bind_failed)?;
            UnixListener::bind(path).map_err(bind_failed)
        }
        Err(e) => Err(bind_failed(e)),
    }
}
