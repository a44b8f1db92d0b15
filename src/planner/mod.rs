//! Save path planning
//!
//! Computes the [`LinkPlan`]: the list of places inside the packaged game
//! tree that must be redirected to the persistent store so saves survive
//! the read-only image.
//!
//! Plan entries use two relative paths:
//!
//! - `source`: where the game reads and writes, relative to the packaged
//!   `game/` directory
//! - `target`: where the data really lives, relative to
//!   `<store root>/<app name>` (empty means that directory itself)

mod pattern;

pub use pattern::SavePattern;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::resolver::{Configuration, Runtime};

/// Save directory NW.js games write next to their entry point
pub const WEB_SAVE_DIR: &str = "save";

/// RPG Maker MV/MZ content directory that gets its own save redirect
pub const WEB_CONTENT_DIR: &str = "www";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A whole directory backed by a persistent directory
    DirectoryRedirect,
    /// A single, explicitly listed file
    FileRedirect,
    /// A single file generated from the numeric save pattern
    PatternRedirect,
}

impl LinkKind {
    pub fn is_directory(&self) -> bool {
        matches!(self, LinkKind::DirectoryRedirect)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LinkKind::DirectoryRedirect => "directory",
            LinkKind::FileRedirect => "save file",
            LinkKind::PatternRedirect => "pattern save",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlanEntry {
    pub source: PathBuf,
    pub target: PathBuf,
    pub kind: LinkKind,
}

impl LinkPlanEntry {
    fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, kind: LinkKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Same relative path on both sides.
    fn mirrored(path: impl Into<PathBuf>, kind: LinkKind) -> Self {
        let path = path.into();
        Self::new(path.clone(), path, kind)
    }
}

impl fmt::Display for LinkPlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> ", self.kind.display_name(), self.source.display())?;
        if self.target.as_os_str().is_empty() {
            f.write_str(".")
        } else {
            write!(f, "{}", self.target.display())
        }
    }
}

/// Ordered redirections for one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    entries: Vec<LinkPlanEntry>,
}

impl LinkPlan {
    pub fn entries(&self) -> &[LinkPlanEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkPlanEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: LinkKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    fn push(&mut self, entry: LinkPlanEntry) {
        self.entries.push(entry);
    }
}

impl<'a> IntoIterator for &'a LinkPlan {
    type Item = &'a LinkPlanEntry;
    type IntoIter = std::slice::Iter<'a, LinkPlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Build the link plan for `config` against the (unpackaged) game tree.
///
/// Listed save files are planned whether or not they exist yet: many games
/// only create them on first save.
pub fn plan(config: &Configuration, source_tree: &Path) -> LinkPlan {
    let mut plan = LinkPlan::default();

    match &config.runtime {
        Runtime::NativeBinaryHosted { .. } => {
            if let Some(dir) = &config.save_dir {
                plan.push(LinkPlanEntry::mirrored(dir, LinkKind::DirectoryRedirect));
            }
            for file in &config.root_save_files {
                plan.push(LinkPlanEntry::mirrored(file, LinkKind::FileRedirect));
            }
            if config.save_dir.is_none() && config.root_save_files.is_empty() {
                // Empty when start > end
                for slot in config.save_start..=config.save_end {
                    let name = config.save_pattern.format(slot);
                    plan.push(LinkPlanEntry::mirrored(name, LinkKind::PatternRedirect));
                }
            }
        }
        Runtime::WebHosted => {
            for point in web_save_points(source_tree) {
                plan.push(LinkPlanEntry::new(point, "", LinkKind::DirectoryRedirect));
            }
            for file in &config.root_save_files {
                plan.push(LinkPlanEntry::mirrored(file, LinkKind::FileRedirect));
            }
        }
    }

    plan
}

/// Directories a web-hosted game saves into: `save`, plus `www/save` when
/// the game keeps its content under `www/`.
pub fn web_save_points(source_tree: &Path) -> Vec<PathBuf> {
    let mut points = vec![PathBuf::from(WEB_SAVE_DIR)];
    let content = source_tree.join(WEB_CONTENT_DIR);
    let is_real_dir = content
        .symlink_metadata()
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if is_real_dir {
        points.push(Path::new(WEB_CONTENT_DIR).join(WEB_SAVE_DIR));
    }
    points
}
