//! Request handling for the daemon loop.
//!
//! Pure logic apart from store persistence. Each handler takes the
//! mutable [`DaemonState`] and produces either a response or a dispatch
//! request; dispatches run off the loop so a slow capture never blocks
//! editor traffic.

use std::path::PathBuf;
use std::sync::Arc;

use crate::dispatch::DispatchOutcome;
use crate::engine::SearchEngine;
use crate::engine::store::EngineStore;
use crate::hotkey::HotkeyRegistry;
use crate::ipc::protocol::{
    BindingDescriptor, ConflictDescriptor, Message, PROTOCOL_VERSION, ResponseBody, Status,
};
use crate::resolver::HotkeyBackend;
use crate::settings::{SettingsPatch, SettingsStore, autostart};

/// Where the autostart entry lives and what it launches.
#[derive(Debug, Clone)]
pub struct Autostart {
    pub entry: PathBuf,
    pub exec: PathBuf,
}

impl Autostart {
    /// Entry under the XDG config home, launching the running binary.
    pub fn detect() -> Option<Self> {
        let entry = autostart::entry_path()?;
        let exec = std::env::current_exe().ok()?;
        Some(Self { entry, exec })
    }

    fn apply(&self, enable: bool) {
        match autostart::apply(&self.entry, enable, &self.exec) {
            Ok(()) => tracing::debug!(enable, path = %self.entry.display(), "autostart applied"),
            Err(e) => {
                tracing::warn!(enable, path = %self.entry.display(), error = %e, "autostart update failed")
            }
        }
    }
}

/// State owned by the daemon loop.
pub struct DaemonState<B: HotkeyBackend> {
    pub store: Arc<EngineStore>,
    pub settings: SettingsStore,
    pub registry: HotkeyRegistry<B>,
    pub autostart: Option<Autostart>,
}

impl<B: HotkeyBackend> DaemonState<B> {
    pub fn new(
        store: Arc<EngineStore>,
        settings: SettingsStore,
        registry: HotkeyRegistry<B>,
        autostart: Option<Autostart>,
    ) -> Self {
        Self {
            store,
            settings,
            registry,
            autostart,
        }
    }

    /// Re-register hotkeys from the current engine list.
    pub fn reconcile(&mut self) -> Vec<ConflictDescriptor> {
        let engines = self.store.list();
        self.registry
            .reconcile(&engines)
            .iter()
            .map(ConflictDescriptor::from)
            .collect()
    }

    /// Bring the autostart entry in line with the stored setting.
    pub fn sync_autostart(&self) {
        if let Some(autostart) = &self.autostart {
            autostart.apply(self.settings.get().run_on_startup);
        }
    }
}

/// What the loop must do with a request.
#[derive(Debug)]
pub enum Handled {
    /// Send this response now.
    Reply(Message),
    /// Run a dispatch and answer `id` with its outcome.
    Dispatch { id: u32, engine_id: String },
}

/// Route a request to its handler.
///
/// Server-originated variants are answered with `unknown_type`.
pub fn handle_message<B: HotkeyBackend>(state: &mut DaemonState<B>, request: Message) -> Handled {
    let response = match request {
        Message::Hello { id, version } => handle_hello(id, version),
        Message::ListEngines { id } => handle_list_engines(state, id),
        Message::UpsertEngine { id, engine } => handle_upsert_engine(state, id, engine),
        Message::DeleteEngine { id, engine_id } => handle_delete_engine(state, id, &engine_id),
        Message::ListBindings { id } => handle_list_bindings(state, id),
        Message::GetSettings { id } => ok_response(
            id,
            ResponseBody {
                settings: Some(state.settings.get()),
                ..ResponseBody::default()
            },
        ),
        Message::UpdateSettings { id, patch } => handle_update_settings(state, id, patch),
        Message::Trigger { id, engine_id } => return Handled::Dispatch { id, engine_id },
        Message::HelloAck { id, .. } | Message::Response { id, .. } => {
            error_response(id, "unknown_type")
        }
    };
    Handled::Reply(response)
}

/// Response carrying a finished dispatch.
pub fn outcome_response(id: u32, outcome: DispatchOutcome) -> Message {
    ok_response(
        id,
        ResponseBody {
            outcome: Some(outcome),
            ..ResponseBody::default()
        },
    )
}

// -- Individual handlers --

fn handle_hello(id: u32, version: u32) -> Message {
    if id != 0 {
        return hello_ack(Status::Error, Some("invalid_hello_id"));
    }
    if version != PROTOCOL_VERSION {
        return hello_ack(Status::Error, Some("version_mismatch"));
    }
    hello_ack(Status::Ok, None)
}

fn handle_list_engines<B: HotkeyBackend>(state: &DaemonState<B>, id: u32) -> Message {
    ok_response(
        id,
        ResponseBody {
            engines: Some(state.store.list()),
            ..ResponseBody::default()
        },
    )
}

fn handle_upsert_engine<B: HotkeyBackend>(
    state: &mut DaemonState<B>,
    id: u32,
    engine: SearchEngine,
) -> Message {
    let stored = match state.store.upsert(engine) {
        Ok(stored) => stored,
        Err(e) => return error_response(id, &e.to_string()),
    };
    tracing::info!(engine_id = %stored.id, name = %stored.name, "engine saved");
    let conflicts = state.reconcile();
    ok_response(
        id,
        ResponseBody {
            engine: Some(stored),
            conflicts: Some(conflicts),
            ..ResponseBody::default()
        },
    )
}

fn handle_delete_engine<B: HotkeyBackend>(
    state: &mut DaemonState<B>,
    id: u32,
    engine_id: &str,
) -> Message {
    match state.store.delete(engine_id) {
        Ok(true) => {
            tracing::info!(engine_id, "engine deleted");
            let conflicts = state.reconcile();
            ok_response(
                id,
                ResponseBody {
                    removed: Some(true),
                    conflicts: Some(conflicts),
                    ..ResponseBody::default()
                },
            )
        }
        Ok(false) => error_response(id, "engine_not_found"),
        Err(e) => error_response(id, &e.to_string()),
    }
}

fn handle_list_bindings<B: HotkeyBackend>(state: &DaemonState<B>, id: u32) -> Message {
    ok_response(
        id,
        ResponseBody {
            bindings: Some(
                state
                    .registry
                    .bindings()
                    .iter()
                    .map(BindingDescriptor::from)
                    .collect(),
            ),
            conflicts: Some(
                state
                    .registry
                    .conflicts()
                    .iter()
                    .map(ConflictDescriptor::from)
                    .collect(),
            ),
            ..ResponseBody::default()
        },
    )
}

fn handle_update_settings<B: HotkeyBackend>(
    state: &mut DaemonState<B>,
    id: u32,
    patch: SettingsPatch,
) -> Message {
    let settings = match state.settings.update(patch) {
        Ok(settings) => settings,
        Err(e) => return error_response(id, &e.to_string()),
    };
    if patch.run_on_startup.is_some() {
        state.sync_autostart();
    }
    ok_response(
        id,
        ResponseBody {
            settings: Some(settings),
            ..ResponseBody::default()
        },
    )
}

// -- Helpers --

fn hello_ack(status: Status, error: Option<&str>) -> Message {
    // hello_ack always carries id 0.
    Message::HelloAck {
        id: 0,
        status,
        error: error.map(Into::into),
    }
}

fn ok_response(id: u32, body: ResponseBody) -> Message {
    Message::Response {
        id,
        status: Status::Ok,
        error: None,
        body,
    }
}

pub(crate) fn error_response(id: u32, reason: &str) -> Message {
    Message::Response {
        id,
        status: Status::Error,
        error: Some(reason.into()),
        body: ResponseBody::default(),
    }
}
