//! CLI client for daemon operations.
//!
//! One-shot commands that connect to the daemon, perform a request,
//! print the result, and exit. Engines are validated here before they
//! are sent so typos surface without a round trip.

mod daemon_client;
mod format;

use crate::cli::EngineAction;
use crate::engine::presets::{PRESETS, preset_name, preset_url};
use crate::engine::{SearchEngine, ValidationError};
use crate::settings::SettingsPatch;
use daemon_client::DaemonClient;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("daemon: {0}")]
    Daemon(String),
    #[error("invalid engine: {0}")]
    Invalid(#[from] ValidationError),
    #[error("unknown preset: {0} (see `snipsearch engines presets`)")]
    UnknownPreset(String),
    #[error("no search engine with id {0}")]
    UnknownEngine(String),
}

/// Run an `engines` subcommand.
pub async fn engines(action: EngineAction) -> Result<(), ClientError> {
    // Presets are static; no daemon needed.
    if let EngineAction::Presets = action {
        format::print_presets(PRESETS);
        return Ok(());
    }

    let mut daemon = DaemonClient::connect().await?;
    match action {
        EngineAction::List => {
            let engines = daemon.list_engines().await?;
            format::print_engines(&engines);
        }
        EngineAction::Add { name, url, hotkey } => {
            let engine = new_engine(name, url, hotkey)?;
            save(&mut daemon, engine).await?;
        }
        EngineAction::Edit {
            id,
            name,
            url,
            hotkey,
        } => {
            let current = daemon
                .list_engines()
                .await?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or(ClientError::UnknownEngine(id))?;
            let engine = apply_edit(current, name, url, hotkey)?;
            save(&mut daemon, engine).await?;
        }
        EngineAction::Remove { id } => {
            let conflicts = daemon.delete_engine(&id).await?;
            format::print_removed(&id);
            format::print_conflicts(&conflicts);
        }
        EngineAction::AddPreset { preset, hotkey } => {
            let engine = preset_engine(&preset, hotkey)?;
            save(&mut daemon, engine).await?;
        }
        EngineAction::Presets => {}
    }
    Ok(())
}

/// Show active bindings and conflicts.
pub async fn bindings() -> Result<(), ClientError> {
    let mut daemon = DaemonClient::connect().await?;
    let report = daemon.list_bindings().await?;
    format::print_bindings(&report);
    Ok(())
}

/// Show settings, applying `patch` first if it changes anything.
pub async fn settings(patch: SettingsPatch) -> Result<(), ClientError> {
    let mut daemon = DaemonClient::connect().await?;
    let settings = if patch == SettingsPatch::default() {
        daemon.get_settings().await?
    } else {
        daemon.update_settings(patch).await?
    };
    format::print_settings(&settings);
    Ok(())
}

/// Dispatch for `engine_id` and print the outcome.
pub async fn trigger(engine_id: &str) -> Result<(), ClientError> {
    let mut daemon = DaemonClient::connect().await?;
    let outcome = daemon.trigger(engine_id).await?;
    format::print_outcome(&outcome);
    Ok(())
}

async fn save(daemon: &mut DaemonClient, engine: SearchEngine) -> Result<(), ClientError> {
    let (stored, conflicts) = daemon.upsert_engine(engine).await?;
    format::print_saved(&stored);
    format::print_conflicts(&conflicts);
    Ok(())
}

fn new_engine(name: String, url: String, hotkey: String) -> Result<SearchEngine, ClientError> {
    let engine = SearchEngine::new(name.trim(), url.trim(), hotkey.trim());
    engine.validate()?;
    Ok(engine)
}

fn apply_edit(
    mut engine: SearchEngine,
    name: Option<String>,
    url: Option<String>,
    hotkey: Option<String>,
) -> Result<SearchEngine, ClientError> {
    if let Some(name) = name {
        engine.name = name.trim().to_string();
    }
    if let Some(url) = url {
        engine.url = url.trim().to_string();
    }
    if let Some(hotkey) = hotkey {
        engine.hotkey = hotkey.trim().to_string();
    }
    engine.validate()?;
    Ok(engine)
}

fn preset_engine(preset: &str, hotkey: String) -> Result<SearchEngine, ClientError> {
    let (Some(name), Some(url)) = (preset_name(preset), preset_url(preset)) else {
        return Err(ClientError::UnknownPreset(preset.to_string()));
    };
    new_engine(name.to_string(), url.to_string(), hotkey)
}
