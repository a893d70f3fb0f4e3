use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::capture::{DEFAULT_MAX_PASSIVE_CHARS, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::feedback::DEFAULT_DISPLAY_TIMEOUT;

#[derive(Parser)]
#[command(name = "snipsearch", about = "Search selected text with a global hotkey")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the hotkey daemon
    Daemon {
        /// Configuration directory (default: $XDG_CONFIG_HOME/snipsearch)
        #[arg(long)]
        config_dir: Option<PathBuf>,

        /// Delay between clipboard polls after a simulated copy
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
        poll_interval_ms: u64,

        /// Clipboard polls before a simulated copy gives up
        #[arg(long, default_value_t = DEFAULT_POLL_ATTEMPTS)]
        poll_attempts: u32,

        /// Clipboard text at or above this length is not used as-is
        #[arg(long, default_value_t = DEFAULT_MAX_PASSIVE_CHARS)]
        max_clipboard_chars: usize,

        /// How long notifications stay on screen
        #[arg(long, default_value_t = DEFAULT_DISPLAY_TIMEOUT.as_millis() as u64)]
        notify_timeout_ms: u64,

        /// Log notifications instead of showing them
        #[arg(long)]
        no_notify: bool,
    },

    /// Manage search engines
    Engines {
        #[command(subcommand)]
        action: EngineAction,
    },

    /// Show registered hotkeys and registration failures
    Bindings,

    /// Show or change settings
    Settings {
        /// Store the dark mode preference
        #[arg(long)]
        dark_mode: Option<bool>,

        /// Start the daemon on login
        #[arg(long)]
        run_on_startup: Option<bool>,
    },

    /// Search the copied or highlighted text with an engine
    Trigger {
        /// Engine id
        engine_id: String,
    },
}

#[derive(Subcommand)]
pub enum EngineAction {
    /// List search engines
    List,

    /// Add a search engine
    Add {
        /// Display name
        name: String,

        /// URL template containing {query}
        url: String,

        /// Hotkey, e.g. Ctrl+Alt+S
        #[arg(long, default_value = "")]
        hotkey: String,
    },

    /// Change fields of an existing engine
    Edit {
        /// Engine id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// New hotkey; an empty string unbinds
        #[arg(long)]
        hotkey: Option<String>,
    },

    /// Remove a search engine
    Remove {
        /// Engine id
        id: String,
    },

    /// List built-in presets
    Presets,

    /// Add a search engine from a preset
    AddPreset {
        /// Preset name, e.g. Google
        preset: String,

        #[arg(long, default_value = "")]
        hotkey: String,
    },
}
