//! Runtime family detection and game tree enumeration
//!
//! All scans are pure filesystem inspection. Walks are sorted by file name
//! so results are stable for a given tree, and symbolic links are never
//! followed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use walkdir::{DirEntry, WalkDir};

use crate::error::ValidationError;
use crate::logging::log_warning;

/// Files at the game root that mark an HTML/JS game
pub const WEB_MARKERS: &[&str] = &["package.json", "index.html"];

/// Windows executable suffix (matched case-insensitively)
pub const EXE_SUFFIX: &str = ".exe";

/// Conventional save directory names (matched case-insensitively)
pub const SAVE_DIR_NAMES: &[&str] = &["save", "saves", "data", "userdata", "mcsc"];

/// Conventional save file extensions
pub const SAVE_FILE_EXTENSIONS: &[&str] = &[
    ".sav", ".save", ".dat", ".ini", ".cfg", ".conf", ".json", ".bin", ".srm",
];

// ============================================================================
// Runtime Family
// ============================================================================

/// The technology hosting the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    /// HTML/JS game run by NW.js
    WebHosted,
    /// Windows binary run through Wine/Proton
    NativeBinaryHosted,
}

impl RuntimeFamily {
    pub fn display_name(&self) -> &'static str {
        match self {
            RuntimeFamily::WebHosted => "NW.js",
            RuntimeFamily::NativeBinaryHosted => "Wine",
        }
    }
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeFamily::WebHosted => "nwjs",
            RuntimeFamily::NativeBinaryHosted => "wine",
        })
    }
}

impl FromStr for RuntimeFamily {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nwjs" | "web" | "web-hosted" | "html" => Ok(RuntimeFamily::WebHosted),
            "wine" | "native" | "native-binary-hosted" | "windows" => {
                Ok(RuntimeFamily::NativeBinaryHosted)
            }
            _ => Err(ValidationError::UnknownRuntime(s.to_string())),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Detect the runtime family, or `None` when the tree gives no hint.
pub fn detect_family(tree: &Path) -> Option<RuntimeFamily> {
    if WEB_MARKERS.iter().any(|m| tree.join(m).is_file()) {
        return Some(RuntimeFamily::WebHosted);
    }
    if walk_files(tree).any(|e| is_windows_executable(&e)) {
        return Some(RuntimeFamily::NativeBinaryHosted);
    }
    None
}

/// Classify a game tree, defaulting to web-hosted when undecidable.
pub fn classify(tree: &Path) -> RuntimeFamily {
    detect_family(tree).unwrap_or_else(|| {
        log_warning(&format!(
            "Could not determine the game type of {}, assuming NW.js",
            tree.display()
        ));
        RuntimeFamily::WebHosted
    })
}

// ============================================================================
// Enumeration
// ============================================================================

/// All Windows executables under `tree`, relative to it.
pub fn list_executables(tree: &Path) -> Vec<PathBuf> {
    walk_files(tree)
        .filter(is_windows_executable)
        .filter_map(|e| relative(tree, e.path()))
        .collect()
}

/// Directories that look like save folders, relative to `tree`.
pub fn list_save_directories(tree: &Path) -> Vec<PathBuf> {
    walk(tree)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            SAVE_DIR_NAMES.contains(&name.as_str())
        })
        .filter_map(|e| relative(tree, e.path()))
        .collect()
}

/// Files with a conventional save extension, relative to `tree`.
pub fn list_candidate_save_files(tree: &Path) -> Vec<PathBuf> {
    walk_files(tree)
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            SAVE_FILE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        })
        .filter_map(|e| relative(tree, e.path()))
        .collect()
}

// ============================================================================
// Internal Functions
// ============================================================================

fn walk(tree: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(tree)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
}

fn walk_files(tree: &Path) -> impl Iterator<Item = DirEntry> {
    walk(tree).filter(|e| e.file_type().is_file())
}

fn is_windows_executable(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_string_lossy()
        .to_lowercase()
        .ends_with(EXE_SUFFIX)
}

fn relative(tree: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(tree).ok().map(Path::to_path_buf)
}
