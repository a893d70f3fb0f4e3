//! Wire protocol message types for daemon IPC.
//!
//! All messages are MessagePack-encoded maps with at minimum `type` and
//! `id` fields. The CLI client sends requests; the daemon answers each
//! with one `response` echoing the request `id`.

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchOutcome;
use crate::engine::SearchEngine;
use crate::hotkey::{ActiveBinding, BindingConflict};
use crate::settings::{Settings, SettingsPatch};

/// All wire protocol messages.
///
/// Serialized as a tagged union on the `type` field via MessagePack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    // -- Handshake --
    Hello {
        id: u32,
        version: u32,
    },

    HelloAck {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Engine store --
    ListEngines {
        id: u32,
    },

    UpsertEngine {
        id: u32,
        engine: SearchEngine,
    },

    DeleteEngine {
        id: u32,
        engine_id: String,
    },

    // -- Registry --
    ListBindings {
        id: u32,
    },

    // -- Settings --
    GetSettings {
        id: u32,
    },

    UpdateSettings {
        id: u32,
        patch: SettingsPatch,
    },

    // -- Dispatch --
    Trigger {
        id: u32,
        engine_id: String,
    },

    // -- Generic response --
    Response {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default)]
        body: ResponseBody,
    },
}

impl Message {
    /// Request id carried by every message.
    pub fn id(&self) -> u32 {
        match self {
            Message::Hello { id, .. }
            | Message::HelloAck { id, .. }
            | Message::ListEngines { id }
            | Message::UpsertEngine { id, .. }
            | Message::DeleteEngine { id, .. }
            | Message::ListBindings { id }
            | Message::GetSettings { id }
            | Message::UpdateSettings { id, .. }
            | Message::Trigger { id, .. }
            | Message::Response { id, .. } => *id,
        }
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Optional payload of a `response`. Each request fills the fields it
/// answers; the rest are omitted on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engines: Option<Vec<SearchEngine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<SearchEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Vec<BindingDescriptor>>,
    /// Registration failures of the current binding generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<ConflictDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DispatchOutcome>,
}

/// An active hotkey binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingDescriptor {
    pub engine_id: String,
    pub engine_name: String,
    pub hotkey: String,
}

impl From<&ActiveBinding> for BindingDescriptor {
    fn from(active: &ActiveBinding) -> Self {
        Self {
            engine_id: active.engine_id.clone(),
            engine_name: active.engine_name.clone(),
            hotkey: active.hotkey.to_string(),
        }
    }
}

/// A hotkey that could not be registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictDescriptor {
    pub engine_id: String,
    pub engine_name: String,
    pub hotkey: String,
    pub reason: String,
}

impl From<&BindingConflict> for ConflictDescriptor {
    fn from(conflict: &BindingConflict) -> Self {
        Self {
            engine_id: conflict.engine_id.clone(),
            engine_name: conflict.engine_name.clone(),
            hotkey: conflict.hotkey.clone(),
            reason: conflict.reason.clone(),
        }
    }
}

/// Protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size (1 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Minimal envelope for extracting `{type, id}` from unknown messages.
///
/// Used by the daemon as a fallback when [`Message`] deserialization
/// fails (e.g., unknown `type` tag), so the error response can echo the
/// request `id`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(msg: &Message) -> Message {
        let encoded = rmp_serde::to_vec_named(msg).unwrap();
        rmp_serde::from_slice(&encoded).unwrap()
    }

    fn google() -> SearchEngine {
        SearchEngine {
            id: "g".into(),
            name: "Google".into(),
            url: "https://www.google.com/search?q={query}".into(),
            hotkey: "Ctrl+Alt+S".into(),
        }
    }

    #[test]
    fn hello_ack_error_round_trip() {
        let msg = Message::HelloAck {
            id: 0,
            status: Status::Error,
            error: Some("version_mismatch".into()),
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn upsert_engine_round_trip() {
        let msg = Message::UpsertEngine {
            id: 3,
            engine: google(),
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn update_settings_partial_patch() {
        let msg = Message::UpdateSettings {
            id: 4,
            patch: SettingsPatch {
                dark_mode: Some(true),
                run_on_startup: None,
            },
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn response_without_body_fields_round_trip() {
        let msg = Message::Response {
            id: 9,
            status: Status::Error,
            error: Some("unknown engine".into()),
            body: ResponseBody::default(),
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn response_with_bindings_and_conflicts() {
        let msg = Message::Response {
            id: 5,
            status: Status::Ok,
            error: None,
            body: ResponseBody {
                bindings: Some(vec![BindingDescriptor {
                    engine_id: "g".into(),
                    engine_name: "Google".into(),
                    hotkey: "Ctrl+Alt+S".into(),
                }]),
                conflicts: Some(vec![ConflictDescriptor {
                    engine_id: "b".into(),
                    engine_name: "Bing".into(),
                    hotkey: "Ctrl+Alt+S".into(),
                    reason: "already bound to \"Google\"".into(),
                }]),
                ..ResponseBody::default()
            },
        };
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn response_with_each_outcome() {
        for outcome in [
            DispatchOutcome::Searched {
                engine: "Google".into(),
                url: "https://www.google.com/search?q=rust".into(),
                preview: "rust".into(),
            },
            DispatchOutcome::NoText {
                engine: "Google".into(),
            },
            DispatchOutcome::Failed {
                reason: "stale".into(),
            },
            DispatchOutcome::Ignored,
        ] {
            let msg = Message::Response {
                id: 1,
                status: Status::Ok,
                error: None,
                body: ResponseBody {
                    outcome: Some(outcome),
                    ..ResponseBody::default()
                },
            };
            assert_eq!(round_trip(&msg), msg);
        }
    }

    #[test]
    fn response_body_may_be_absent() {
        #[derive(Serialize)]
        struct Bare {
            #[serde(rename = "type")]
            msg_type: &'static str,
            id: u32,
            status: Status,
        }
        let encoded = rmp_serde::to_vec_named(&Bare {
            msg_type: "response",
            id: 2,
            status: Status::Ok,
        })
        .unwrap();
        let decoded: Message = rmp_serde::from_slice(&encoded).unwrap();
        assert_eq!(
            decoded,
            Message::Response {
                id: 2,
                status: Status::Ok,
                error: None,
                body: ResponseBody::default(),
            }
        );
    }

    #[test]
    fn type_tags_are_snake_case() {
        let encoded = rmp_serde::to_vec_named(&Message::ListBindings { id: 1 }).unwrap();
        let envelope: RawEnvelope = rmp_serde::from_slice(&encoded).unwrap();
        assert_eq!(envelope.msg_type, "list_bindings");
        assert_eq!(envelope.id, 1);
    }

    #[test]
    fn id_accessor_covers_variants() {
        assert_eq!(Message::GetSettings { id: 7 }.id(), 7);
        assert_eq!(
            Message::Trigger {
                id: 8,
                engine_id: "g".into()
            }
            .id(),
            8
        );
    }

    #[test]
    fn status_serialization() {
        let ok = rmp_serde::to_vec_named(&Status::Ok).unwrap();
        let decoded: String = rmp_serde::from_slice(&ok).unwrap();
        assert_eq!(decoded, "ok");
    }
}
