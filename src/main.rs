mod capture;
mod cli;
mod client;
mod daemon;
mod dispatch;
mod engine;
mod feedback;
mod hotkey;
mod ipc;
mod resolver;
mod settings;
#[cfg(test)]
mod testing;

use std::fmt::Display;
use std::time::Duration;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

use crate::capture::CaptureConfig;
use crate::settings::SettingsPatch;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Daemon {
            config_dir,
            poll_interval_ms,
            poll_attempts,
            max_clipboard_chars,
            notify_timeout_ms,
            no_notify,
        } => {
            let Some(config_dir) = settings::config_dir(config_dir.as_deref()) else {
                exit_with("daemon", "cannot locate the config directory (set $HOME or --config-dir)");
            };
            let config = daemon::DaemonConfig {
                config_dir,
                capture: CaptureConfig {
                    poll_interval: Duration::from_millis(poll_interval_ms),
                    poll_attempts,
                    max_passive_chars: max_clipboard_chars,
                },
                notify_timeout: Duration::from_millis(notify_timeout_ms),
                notify: !no_notify,
            };
            if let Err(e) = daemon::run(config).await {
                exit_with("daemon", e);
            }
        }
        Command::Engines { action } => {
            if let Err(e) = client::engines(action).await {
                exit_with("engines", e);
            }
        }
        Command::Bindings => {
            if let Err(e) = client::bindings().await {
                exit_with("bindings", e);
            }
        }
        Command::Settings {
            dark_mode,
            run_on_startup,
        } => {
            let patch = SettingsPatch {
                dark_mode,
                run_on_startup,
            };
            if let Err(e) = client::settings(patch).await {
                exit_with("settings", e);
            }
        }
        Command::Trigger { engine_id } => {
            if let Err(e) = client::trigger(&engine_id).await {
                exit_with("trigger", e);
            }
        }
    }
}

fn exit_with(command: &str, error: impl Display) -> ! {
    tracing::error!(command, error = %error, "command failed");
    eprintln!("snipsearch {command}: {error}");
    std::process::exit(1);
}
