//! User settings and configuration paths.
//!
//! Settings are two flags persisted in `settings.json` next to the
//! engine store. `run_on_startup` is applied through an XDG autostart
//! entry; `dark_mode` is stored for the UI and otherwise unused here.

pub mod autostart;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::store::{StoreError, write_atomic};

/// Application directory name under the XDG config/runtime dirs.
pub const APP_DIR: &str = "snipsearch";

/// Persisted user settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub run_on_startup: bool,
}

/// Partial settings update; `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_on_startup: Option<bool>,
}

/// Settings with optional file persistence.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    current: Settings,
}

impl SettingsStore {
    /// Load settings from `path`; a missing file yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path: Some(path),
            current,
        })
    }

    #[cfg(test)]
    pub fn in_memory(current: Settings) -> Self {
        Self {
            path: None,
            current,
        }
    }

    pub fn get(&self) -> Settings {
        self.current
    }

    /// Apply a patch and persist. Returns the new settings.
    pub fn update(&mut self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        let mut next = self.current;
        if let Some(dark_mode) = patch.dark_mode {
            next.dark_mode = dark_mode;
        }
        if let Some(run_on_startup) = patch.run_on_startup {
            next.run_on_startup = run_on_startup;
        }
        if let Some(path) = &self.path {
            let json =
                serde_json::to_vec_pretty(&next).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            write_atomic(path, &json)?;
        }
        self.current = next;
        Ok(next)
    }
}

/// Resolve the configuration directory.
///
/// Order: explicit override, `$XDG_CONFIG_HOME/snipsearch`,
/// `$HOME/.config/snipsearch`.
pub fn config_dir(override_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = override_dir {
        return Some(dir.to_path_buf());
    }
    xdg_config_home().map(|base| base.join(APP_DIR))
}

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn xdg_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")),
    }
}
