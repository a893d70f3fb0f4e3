//! Search engine model: name, URL template, and hotkey.
//!
//! A [`SearchEngine`] is the unit the user binds to a global hotkey.
//! Engines are created by the editor (CLI client), persisted by the
//! [`store::EngineStore`], and replaced wholesale by id.

pub mod hotkey;
pub mod presets;
pub mod store;

use serde::{Deserialize, Serialize};

use hotkey::{Hotkey, HotkeySpecError};

/// Placeholder substituted with the captured text.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Validation errors for editor-produced engines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("URL must contain the {{query}} placeholder")]
    MissingPlaceholder,
    #[error("invalid hotkey: {0}")]
    InvalidHotkey(#[from] HotkeySpecError),
}

/// A user-defined search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    /// Opaque unique id, stable across edits.
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL template containing [`QUERY_PLACEHOLDER`].
    pub url: String,
    /// Hotkey specification; empty means unbound.
    #[serde(default)]
    pub hotkey: String,
}

impl SearchEngine {
    /// Create an engine with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        hotkey: impl Into<String>,
    ) -> Self {
        Self {
            id: new_engine_id(),
            name: name.into(),
            url: url.into(),
            hotkey: hotkey.into(),
        }
    }

    /// Parse this engine's hotkey. `Ok(None)` if unbound.
    pub fn parsed_hotkey(&self) -> Result<Option<Hotkey>, HotkeySpecError> {
        Hotkey::parse_optional(&self.hotkey)
    }

    /// Check the editor preconditions: non-empty name, URL with
    /// placeholder, parseable (or empty) hotkey.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.url.contains(QUERY_PLACEHOLDER) {
            return Err(ValidationError::MissingPlaceholder);
        }
        self.parsed_hotkey()?;
        Ok(())
    }

    /// Rewrite the hotkey into its normalized form, if it parses.
    pub fn normalize_hotkey(&mut self) {
        if let Ok(parsed) = self.parsed_hotkey() {
            self.hotkey = parsed.map(|h| h.to_string()).unwrap_or_default();
        }
    }
}

/// Generate a new opaque engine id.
pub fn new_engine_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
