use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::paths::home_dir;

// ============================================================================
// Persisted Tool Settings
// ============================================================================

/// Settings that outlive a single build: where persistent saves live and
/// which runtimes the generated launchers call.
///
/// These are the "default" provider for the matching configuration fields;
/// anything given explicitly on the command line wins over them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// Persistent save root for web-hosted (NW.js) packages
    pub save_root: PathBuf,
    /// Persistent archive root for native-binary-hosted (Wine) packages
    pub archive_root: PathBuf,
    /// Windows compatibility runner invoked by native launchers
    pub wine_cmd: String,
    /// NW.js executable invoked by web launchers
    pub nwjs_path: PathBuf,
    /// Explicit appimagetool location (otherwise looked up on PATH)
    pub appimagetool: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let home = home_dir();
        Self {
            save_root: home.join("Game/HTMLGame/NWJS/SAVE"),
            archive_root: home.join("Game/WineGame/Save"),
            wine_cmd: "proton-ge".to_string(),
            nwjs_path: home.join("App/nwjs-sdk/nw"),
            appimagetool: None,
        }
    }
}

impl AppSettings {
    fn get_path() -> PathBuf {
        crate::agamepack_path!("config.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::get_path())
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => crate::logging::log_warning(&format!(
                        "Ignoring unreadable settings file {}: {}",
                        path.display(),
                        e
                    )),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        self.save_to(&Self::get_path());
    }

    pub fn save_to(&self, path: &std::path::Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::write(path, json) {
                crate::logging::log_warning(&format!(
                    "Failed to save settings to {}: {}",
                    path.display(),
                    e
                ));
            }
        }
    }
}
