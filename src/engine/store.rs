//! Engine store: the persisted list of search engines.
//!
//! Backed by a JSON file written atomically (temp file + rename) after
//! every mutation. Shared between the daemon loop, which mutates it in
//! response to editor requests, and dispatch workers, which look engines
//! up by id.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use super::{SearchEngine, ValidationError, new_engine_id};

/// Engine store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid engine: {0}")]
    Invalid(#[from] ValidationError),
}

/// Search engine collection with optional file persistence.
#[derive(Debug)]
pub struct EngineStore {
    /// `None` for an in-memory store (tests).
    path: Option<PathBuf>,
    engines: RwLock<Vec<SearchEngine>>,
}

impl EngineStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let engines = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        tracing::debug!(path = %path.display(), count = engines.len(), "engine store loaded");

        Ok(Self {
            path: Some(path),
            engines: RwLock::new(engines),
        })
    }

    /// Create a store that is never written to disk.
    #[cfg(test)]
    pub fn in_memory(engines: Vec<SearchEngine>) -> Self {
        Self {
            path: None,
            engines: RwLock::new(engines),
        }
    }

    /// Snapshot of all engines in list order.
    pub fn list(&self) -> Vec<SearchEngine> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up an engine by id.
    pub fn get(&self, id: &str) -> Option<SearchEngine> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Insert or replace an engine by id.
    ///
    /// An empty id gets a fresh one. Replacement keeps the list
    /// position; new engines are appended. The hotkey is stored in
    /// normalized form. Returns the stored engine.
    pub fn upsert(&self, mut engine: SearchEngine) -> Result<SearchEngine, StoreError> {
        engine.validate()?;
        engine.normalize_hotkey();
        if engine.id.trim().is_empty() {
            engine.id = new_engine_id();
        }

        let mut engines = self.engines.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = engines.clone();
        match next.iter_mut().find(|e| e.id == engine.id) {
            Some(existing) => *existing = engine.clone(),
            None => next.push(engine.clone()),
        }
        self.persist(&next)?;
        *engines = next;
        Ok(engine)
    }

    /// Delete an engine by id. Returns `false` if no such engine existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut engines = self.engines.write().unwrap_or_else(PoisonError::into_inner);
        if !engines.iter().any(|e| e.id == id) {
            return Ok(false);
        }
        let next: Vec<SearchEngine> = engines.iter().filter(|e| e.id != id).cloned().collect();
        self.persist(&next)?;
        *engines = next;
        Ok(true)
    }

    /// Write `engines` to disk. The in-memory list is only swapped by
    /// callers after this succeeds.
    fn persist(&self, engines: &[SearchEngine]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(engines).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        write_atomic(path, &json)
    }
}

/// Write `contents` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)
}
