//! Link materialization
//!
//! Executes a [`LinkPlan`] against a populated package tree. Every
//! redirection point inside `game/` is replaced by a symbolic link into the
//! persistent store. When links cannot be created (filesystem without
//! symlink support, permissions) the degraded strategy copies persistent
//! content into the package instead, so the game still sees its saves even
//! though new writes will not persist.
//!
//! Re-running over the same tree is safe: occupied points are cleared and
//! recreated, persistent targets are only ever created, never emptied.

mod fs_ops;

pub use fs_ops::{copy_dir_all, remove_existing};

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::MaterializeError;
use crate::logging::{log_link, log_warning};
use crate::planner::{LinkKind, LinkPlan, LinkPlanEntry};

const PROBE_NAME: &str = ".agamepack-link-probe";

// ============================================================================
// Strategies
// ============================================================================

/// What a strategy did with one redirection point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirected {
    /// Point is a symbolic link to the persistent target
    Linked,
    /// Persistent content was copied into the package
    Copied,
    /// Nothing to copy; the point was left absent
    Skipped,
}

/// One way of making `point` show the content of `target`.
///
/// `point` is cleared and its parent exists when this is called; `target`
/// exists when `kind` is a directory redirect.
pub trait LinkStrategy {
    fn name(&self) -> &'static str;

    fn redirect(&self, point: &Path, target: &Path, kind: LinkKind) -> Result<Redirected, MaterializeError>;
}

/// Primary strategy: a symbolic link from the point to the target.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkStrategy;

impl LinkStrategy for SymlinkStrategy {
    fn name(&self) -> &'static str {
        "symlink"
    }

    fn redirect(&self, point: &Path, target: &Path, _kind: LinkKind) -> Result<Redirected, MaterializeError> {
        symlink(target, point).map_err(|source| MaterializeError::Redirection {
            point: point.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })?;
        Ok(Redirected::Linked)
    }
}

/// Degraded strategy: copy persistent content into the package.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyStrategy;

impl LinkStrategy for CopyStrategy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn redirect(&self, point: &Path, target: &Path, kind: LinkKind) -> Result<Redirected, MaterializeError> {
        let copy_err = |source| MaterializeError::Copy {
            from: target.to_path_buf(),
            to: point.to_path_buf(),
            source,
        };

        if kind.is_directory() {
            copy_dir_all(target, point, None).map_err(copy_err)?;
            log_warning(&format!(
                "Copied {} into the package; saves written there will not persist",
                target.display()
            ));
            return Ok(Redirected::Copied);
        }

        if target.is_file() {
            fs::copy(target, point).map_err(copy_err)?;
            log_warning(&format!(
                "Copied {} into the package; changes to it will not persist",
                target.display()
            ));
            Ok(Redirected::Copied)
        } else {
            log_warning(&format!(
                "No persistent copy of {} yet, leaving it out of the package",
                point.display()
            ));
            Ok(Redirected::Skipped)
        }
    }
}

// ============================================================================
// Materializer
// ============================================================================

/// Outcome of a whole plan
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub linked: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failures: Vec<(LinkPlanEntry, MaterializeError)>,
}

impl MaterializeReport {
    pub fn total(&self) -> usize {
        self.linked + self.copied + self.skipped + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.copied == 0 && self.skipped == 0 && self.failures.is_empty()
    }
}

pub struct LinkMaterializer {
    game_root: PathBuf,
    store_dir: PathBuf,
    primary: Box<dyn LinkStrategy>,
    degraded: Box<dyn LinkStrategy>,
    links_supported: bool,
}

impl LinkMaterializer {
    /// Materializer for `game_root` (the packaged `game/` directory) backed
    /// by `store_dir` (`<store root>/<app name>`). Probes once whether
    /// symbolic links can be created inside the package tree.
    pub fn probe(game_root: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        let game_root = game_root.into();
        let links_supported = symlinks_supported(&game_root);
        if !links_supported {
            log_warning(&format!(
                "Symbolic links are not supported in {}, saves will be copied instead",
                game_root.display()
            ));
        }
        Self {
            game_root,
            store_dir: store_dir.into(),
            primary: Box::new(SymlinkStrategy),
            degraded: Box::new(CopyStrategy),
            links_supported,
        }
    }

    /// Materializer with caller-supplied strategies, assuming the primary
    /// one is usable.
    pub fn with_strategies(
        game_root: impl Into<PathBuf>,
        store_dir: impl Into<PathBuf>,
        primary: Box<dyn LinkStrategy>,
        degraded: Box<dyn LinkStrategy>,
    ) -> Self {
        Self {
            game_root: game_root.into(),
            store_dir: store_dir.into(),
            primary,
            degraded,
            links_supported: true,
        }
    }

    pub fn links_supported(&self) -> bool {
        self.links_supported
    }

    /// Persistent location backing `entry`.
    pub fn target_path(&self, entry: &LinkPlanEntry) -> PathBuf {
        if entry.target.as_os_str().is_empty() {
            self.store_dir.clone()
        } else {
            self.store_dir.join(&entry.target)
        }
    }

    pub fn point_path(&self, entry: &LinkPlanEntry) -> PathBuf {
        self.game_root.join(&entry.source)
    }

    /// Materialize one plan entry.
    pub fn materialize(&self, entry: &LinkPlanEntry) -> Result<Redirected, MaterializeError> {
        let target = self.target_path(entry);
        let point = self.point_path(entry);

        let target_dir = if entry.kind.is_directory() {
            Some(target.as_path())
        } else {
            target.parent()
        };
        if let Some(dir) = target_dir {
            fs::create_dir_all(dir).map_err(|source| MaterializeError::Prepare {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        self.clear_point(&point)?;

        if self.links_supported {
            match self.primary.redirect(&point, &target, entry.kind) {
                Ok(outcome) => {
                    log_link(&format!("{} -> {}", point.display(), target.display()));
                    return Ok(outcome);
                }
                Err(e) => {
                    log_warning(&format!("{}; falling back to {}", e, self.degraded.name()));
                    // A failed attempt may leave a partial point behind
                    self.clear_point(&point)?;
                }
            }
        }

        self.degraded.redirect(&point, &target, entry.kind)
    }

    /// Materialize every entry in plan order. Failures are collected, never
    /// fatal.
    pub fn materialize_plan(&self, plan: &LinkPlan) -> MaterializeReport {
        let mut report = MaterializeReport::default();
        for entry in plan {
            match self.materialize(entry) {
                Ok(Redirected::Linked) => report.linked += 1,
                Ok(Redirected::Copied) => report.copied += 1,
                Ok(Redirected::Skipped) => report.skipped += 1,
                Err(e) => {
                    log_warning(&format!("Could not redirect {}: {}", entry.source.display(), e));
                    report.failures.push((entry.clone(), e));
                }
            }
        }
        report
    }

    fn clear_point(&self, point: &Path) -> Result<(), MaterializeError> {
        remove_existing(point).map_err(|source| MaterializeError::Prepare {
            path: point.to_path_buf(),
            source,
        })?;
        if let Some(parent) = point.parent() {
            fs::create_dir_all(parent).map_err(|source| MaterializeError::Prepare {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Try to create (and remove) a throwaway link inside `dir`.
fn symlinks_supported(dir: &Path) -> bool {
    let probe = dir.join(PROBE_NAME);
    let _ = remove_existing(&probe);
    let ok = symlink(".", &probe).is_ok();
    let _ = fs::remove_file(&probe);
    ok
}
