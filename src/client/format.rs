//! Output formatting for CLI client commands: human-readable tables
//! and status lines on stdout, conflicts on stderr.

use crate::dispatch::DispatchOutcome;
use crate::engine::SearchEngine;
use crate::ipc::protocol::ConflictDescriptor;
use crate::settings::Settings;

use super::daemon_client::BindingReport;

/// Print engines as a table to stdout.
pub fn print_engines(engines: &[SearchEngine]) {
    if engines.is_empty() {
        println!("No search engines");
        return;
    }

    println!("{:<38} {:<20} {:<18} URL", "ID", "NAME", "HOTKEY");
    println!("{}", "-".repeat(100));
    for e in engines {
        println!(
            "{:<38} {:<20} {:<18} {}",
            e.id,
            e.name,
            format_hotkey(&e.hotkey),
            e.url
        );
    }
}

/// Print the built-in presets.
pub fn print_presets(presets: &[(&str, &str)]) {
    println!("{:<16} URL", "PRESET");
    println!("{}", "-".repeat(80));
    for (name, url) in presets {
        println!("{name:<16} {url}");
    }
}

pub fn print_saved(engine: &SearchEngine) {
    println!(
        "Saved {} ({}) hotkey {}",
        engine.name,
        engine.id,
        format_hotkey(&engine.hotkey)
    );
}

pub fn print_removed(engine_id: &str) {
    println!("Removed {engine_id}");
}

/// Print active bindings and registration failures.
pub fn print_bindings(report: &BindingReport) {
    if report.bindings.is_empty() {
        println!("No active hotkeys");
    } else {
        println!("{:<18} {:<20} ENGINE_ID", "HOTKEY", "ENGINE");
        println!("{}", "-".repeat(76));
        for b in &report.bindings {
            println!("{:<18} {:<20} {}", b.hotkey, b.engine_name, b.engine_id);
        }
    }
    print_conflicts(&report.conflicts);
}

/// Print registration failures to stderr.
pub fn print_conflicts(conflicts: &[ConflictDescriptor]) {
    for c in conflicts {
        eprintln!(
            "warning: hotkey {} for {} not registered: {}",
            format_hotkey(&c.hotkey),
            c.engine_name,
            c.reason
        );
    }
}

pub fn print_settings(settings: &Settings) {
    println!("dark_mode:      {}", settings.dark_mode);
    println!("run_on_startup: {}", settings.run_on_startup);
}

pub fn print_outcome(outcome: &DispatchOutcome) {
    println!("{}", describe_outcome(outcome));
}

fn describe_outcome(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Searched {
            engine,
            url,
            preview,
        } => format!("Searched {engine} for \"{preview}\"\n{url}"),
        DispatchOutcome::NoText { engine } => {
            format!("{engine}: no text found. Copy text first, then try again.")
        }
        DispatchOutcome::Failed { reason } => format!("Search failed: {reason}"),
        DispatchOutcome::Ignored => "A search for this engine is already running".to_string(),
    }
}

fn format_hotkey(hotkey: &str) -> &str {
    if hotkey.is_empty() { "-" } else { hotkey }
}
