//! Daemon client for one-shot CLI commands.
//!
//! Connects to the daemon socket, performs the handshake, and wraps
//! each request in a typed method.

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::dispatch::DispatchOutcome;
use crate::engine::SearchEngine;
use crate::ipc::codec::LengthPrefixedCodec;
use crate::ipc::protocol::{
    BindingDescriptor, ConflictDescriptor, Message, PROTOCOL_VERSION, ResponseBody, Status,
};
use crate::settings::{Settings, SettingsPatch};

use super::ClientError;

/// Active bindings plus the hotkeys that failed to register.
pub struct BindingReport {
    pub bindings: Vec<BindingDescriptor>,
    pub conflicts: Vec<ConflictDescriptor>,
}

/// Each CLI invocation performs a handful of sequential request-response
/// cycles, so no split sink/stream is needed.
pub struct DaemonClient {
    framed: Framed<UnixStream, LengthPrefixedCodec>,
    next_id: u32,
}

impl DaemonClient {
    /// Connect to the daemon and perform the handshake.
    pub async fn connect() -> Result<Self, ClientError> {
        let socket_path =
            crate::daemon::socket_path().map_err(|e| ClientError::Daemon(e.to_string()))?;

        let stream = UnixStream::connect(&socket_path).await.map_err(|e| {
            ClientError::Daemon(format!(
                "connect to {} failed: {e} (is `snipsearch daemon` running?)",
                socket_path.display()
            ))
        })?;
        let mut framed = Framed::new(stream, LengthPrefixedCodec::new());

        framed
            .send(Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION,
            })
            .await
            .map_err(|e| ClientError::Daemon(format!("send hello: {e}")))?;

        match framed.next().await {
            Some(Ok(Message::HelloAck {
                status: Status::Ok, ..
            })) => {}
            Some(Ok(Message::HelloAck {
                status: Status::Error,
                error,
                ..
            })) => {
                return Err(ClientError::Daemon(format!(
                    "handshake rejected: {}",
                    error.unwrap_or_default()
                )));
            }
            other => {
                return Err(ClientError::Daemon(format!(
                    "unexpected handshake response: {other:?}"
                )));
            }
        }

        Ok(Self {
            framed,
            next_id: 1, // 0 = Hello
        })
    }

    pub async fn list_engines(&mut self) -> Result<Vec<SearchEngine>, ClientError> {
        let body = self
            .request("list_engines", |id| Message::ListEngines { id })
            .await?;
        Ok(body.engines.unwrap_or_default())
    }

    /// Save an engine. Returns the stored engine and the conflicts of
    /// the resulting binding generation.
    pub async fn upsert_engine(
        &mut self,
        engine: SearchEngine,
    ) -> Result<(SearchEngine, Vec<ConflictDescriptor>), ClientError> {
        let body = self
            .request("upsert_engine", |id| Message::UpsertEngine { id, engine })
            .await?;
        let stored = body
            .engine
            .ok_or_else(|| ClientError::Daemon("upsert_engine: response without engine".into()))?;
        Ok((stored, body.conflicts.unwrap_or_default()))
    }

    pub async fn delete_engine(
        &mut self,
        engine_id: &str,
    ) -> Result<Vec<ConflictDescriptor>, ClientError> {
        let engine_id = engine_id.to_string();
        let body = self
            .request("delete_engine", |id| Message::DeleteEngine { id, engine_id })
            .await?;
        Ok(body.conflicts.unwrap_or_default())
    }

    pub async fn list_bindings(&mut self) -> Result<BindingReport, ClientError> {
        let body = self
            .request("list_bindings", |id| Message::ListBindings { id })
            .await?;
        Ok(BindingReport {
            bindings: body.bindings.unwrap_or_default(),
            conflicts: body.conflicts.unwrap_or_default(),
        })
    }

    pub async fn get_settings(&mut self) -> Result<Settings, ClientError> {
        let body = self
            .request("get_settings", |id| Message::GetSettings { id })
            .await?;
        body.settings
            .ok_or_else(|| ClientError::Daemon("get_settings: response without settings".into()))
    }

    pub async fn update_settings(&mut self, patch: SettingsPatch) -> Result<Settings, ClientError> {
        let body = self
            .request("update_settings", |id| Message::UpdateSettings { id, patch })
            .await?;
        body.settings.ok_or_else(|| {
            ClientError::Daemon("update_settings: response without settings".into())
        })
    }

    /// Run a dispatch and wait for its outcome.
    pub async fn trigger(&mut self, engine_id: &str) -> Result<DispatchOutcome, ClientError> {
        let engine_id = engine_id.to_string();
        let body = self
            .request("trigger", |id| Message::Trigger { id, engine_id })
            .await?;
        body.outcome
            .ok_or_else(|| ClientError::Daemon("trigger: response without outcome".into()))
    }

    /// Send one request and wait for its response body.
    async fn request(
        &mut self,
        op: &str,
        build: impl FnOnce(u32) -> Message,
    ) -> Result<ResponseBody, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        self.framed
            .send(build(id))
            .await
            .map_err(|e| ClientError::Daemon(format!("send {op}: {e}")))?;

        match self.framed.next().await {
            Some(Ok(Message::Response {
                id: response_id,
                status: Status::Ok,
                body,
                ..
            })) if response_id == id => Ok(body),
            Some(Ok(Message::Response {
                status: Status::Error,
                error,
                ..
            })) => Err(ClientError::Daemon(format!(
                "{op} failed: {}",
                error.unwrap_or_default()
            ))),
            other => Err(ClientError::Daemon(format!(
                "unexpected {op} response: {other:?}"
            ))),
        }
    }
}
