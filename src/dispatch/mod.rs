//! Dispatch engine: hotkey activation to opened search URL.
//!
//! A dispatch looks up the engine, captures the selection inside the
//! clipboard guard, builds the URL, opens it, and reports exactly one
//! notification. Nothing in here panics or propagates errors to the
//! caller: every failure becomes a [`DispatchOutcome`].
//!
//! Single-flight: an activation for an engine whose dispatch is still
//! running is ignored. Dispatches for different engines proceed
//! independently but queue on the clipboard guard.

pub mod url;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureChain, ClipboardGuard};
use crate::engine::store::EngineStore;
use crate::feedback::{FeedbackSink, NotifyKind};
use crate::resolver::{ResolverError, UrlOpener};

pub use url::{build_search_url, preview};

const GUIDANCE_TITLE: &str = "No text found";
const GUIDANCE_BODY: &str =
    "Copy text (Ctrl+C) first, then use the hotkey. Or select text and copy it manually.";
const ERROR_TITLE: &str = "Search Error";
const ERROR_BODY: &str = "Failed to perform search. Please try copying text manually first.";

/// Dispatch failures. Reported to the user, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("search engine {0:?} no longer exists")]
    StaleEngine(String),
    #[error("URL template {0:?} has no {{query}} placeholder")]
    MalformedTemplate(String),
    #[error("failed to open URL: {0}")]
    Open(#[from] ResolverError),
}

/// Terminal outcome of one activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// URL opened.
    Searched {
        engine: String,
        url: String,
        preview: String,
    },
    /// No strategy captured text; guidance shown.
    NoText { engine: String },
    /// Lookup, URL build, or open failed; error shown.
    Failed { reason: String },
    /// Same engine already in flight; nothing done.
    Ignored,
}

/// What started a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Hotkey,
    Request,
}

/// Runs dispatches. Shared across blocking worker threads via `Arc`.
pub struct Dispatcher {
    store: Arc<EngineStore>,
    guard: ClipboardGuard,
    chain: CaptureChain,
    opener: Arc<dyn UrlOpener>,
    feedback: Arc<dyn FeedbackSink>,
    in_flight: Mutex<HashSet<String>>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<EngineStore>,
        guard: ClipboardGuard,
        chain: CaptureChain,
        opener: Arc<dyn UrlOpener>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Self {
        Self {
            store,
            guard,
            chain,
            opener,
            feedback,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run the full pipeline for a hotkey press of `engine_id`. Blocks for
    /// at most the capture chain's bounded wait.
    pub fn dispatch(&self, engine_id: &str) -> DispatchOutcome {
        self.dispatch_as(engine_id, Activation::Hotkey)
    }

    /// Run the pipeline for a trigger request from a client.
    ///
    /// The foreground window is then usually the client's own terminal,
    /// where a synthetic Ctrl+C would interrupt the waiting client, so
    /// no input is injected.
    pub fn dispatch_request(&self, engine_id: &str) -> DispatchOutcome {
        self.dispatch_as(engine_id, Activation::Request)
    }

    fn dispatch_as(&self, engine_id: &str, activation: Activation) -> DispatchOutcome {
        let Some(_flight) = InFlight::enter(&self.in_flight, engine_id) else {
            tracing::debug!(engine_id, "dispatch already in flight, ignoring activation");
            return DispatchOutcome::Ignored;
        };

        let outcome = self.run(engine_id, activation).unwrap_or_else(|e| {
            tracing::warn!(engine_id, error = %e, "dispatch failed");
            DispatchOutcome::Failed {
                reason: e.to_string(),
            }
        });
        self.report(&outcome);
        outcome
    }

    fn run(&self, engine_id: &str, activation: Activation) -> Result<DispatchOutcome, DispatchError> {
        let engine = self
            .store
            .get(engine_id)
            .ok_or_else(|| DispatchError::StaleEngine(engine_id.to_string()))?;

        let captured = self.guard.with_guard(|| match activation {
            Activation::Hotkey => self.chain.capture(),
            Activation::Request => self.chain.capture_without_input(),
        });
        let Some(text) = captured.text() else {
            tracing::info!(engine = %engine.name, "no text captured");
            return Ok(DispatchOutcome::NoText {
                engine: engine.name,
            });
        };

        let url = build_search_url(&engine.url, text)?;
        self.opener.open(&url)?;
        tracing::info!(engine = %engine.name, chars = text.chars().count(), "search opened");

        Ok(DispatchOutcome::Searched {
            engine: engine.name,
            url,
            preview: preview(text),
        })
    }

    fn report(&self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Searched {
                engine, preview, ..
            } => self.feedback.notify(
                NotifyKind::Success,
                &format!("Searching {engine}"),
                &format!("Searching for: {preview}"),
            ),
            DispatchOutcome::NoText { .. } => {
                self.feedback
                    .notify(NotifyKind::Guidance, GUIDANCE_TITLE, GUIDANCE_BODY)
            }
            DispatchOutcome::Failed { .. } => {
                self.feedback.notify(NotifyKind::Error, ERROR_TITLE, ERROR_BODY)
            }
            DispatchOutcome::Ignored => {}
        }
    }
}

/// Marks an engine id as in flight until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    engine_id: String,
}

impl<'a> InFlight<'a> {
    fn enter(set: &'a Mutex<HashSet<String>>, engine_id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(engine_id.to_string());
        inserted.then(|| Self {
            set,
            engine_id: engine_id.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.engine_id);
    }
}
