//! Launch-on-startup via an XDG autostart desktop entry.

use std::path::{Path, PathBuf};

/// File name of the autostart entry.
const ENTRY_NAME: &str = "snipsearch.desktop";

/// Path of the autostart entry under `$XDG_CONFIG_HOME/autostart`.
pub fn entry_path() -> Option<PathBuf> {
    super::xdg_config_home().map(|base| base.join("autostart").join(ENTRY_NAME))
}

/// Create or remove the autostart entry at `path`.
///
/// Removing an absent entry is not an error.
pub fn apply(path: &Path, enable: bool, exec: &Path) -> std::io::Result<()> {
    if enable {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, desktop_entry(exec))
    } else {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn desktop_entry(exec: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=SnipSearch\n\
         Comment=Search selected text with a global hotkey\n\
         Exec=\"{}\" daemon\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        exec.display()
    )
}
