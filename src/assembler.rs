//! Package assembly
//!
//! Lays out `<assembly root>/<App>.AppDir`, copies the game, redirects its
//! save locations, writes the launcher, desktop entry and icon, then hands
//! the AppDir to the bundler and cleans up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bundler::{run_bundler, BundleOutcome};
use crate::error::{PackError, ValidationError};
use crate::icon::{create_icon, IconSource};
use crate::logging::{log_action, log_info, log_warning};
use crate::materializer::{copy_dir_all, remove_existing, LinkMaterializer, MaterializeReport};
use crate::planner::{self, LinkPlan};
use crate::resolver::{Configuration, Runtime, PACKAGE_SUFFIX};
use crate::scripts::ScriptGenerator;
use crate::tools::keep_build_dir;
use crate::wizard::Prompter;

/// Game content inside the AppDir
pub const GAME_DIR: &str = "game";

/// Mount area reserved next to `game/` in Wine packages
pub const ARCHIVE_DIR: &str = "archive";

/// Entries a previous build leaves in the assembly root
const BUILD_OUTPUT_SUFFIXES: &[&str] = &[".AppDir", PACKAGE_SUFFIX];

// ============================================================================
// Types
// ============================================================================

/// Paths of one assembled package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTree {
    pub assembly_root: PathBuf,
    pub app_dir: PathBuf,
    pub game_dir: PathBuf,
    pub archive_dir: Option<PathBuf>,
}

impl PackageTree {
    pub fn new(config: &Configuration) -> Self {
        let app_dir = config.assembly_root.join(config.app_dir_name());
        let archive_dir = match config.runtime {
            Runtime::NativeBinaryHosted { .. } => Some(app_dir.join(ARCHIVE_DIR)),
            Runtime::WebHosted => None,
        };
        Self {
            assembly_root: config.assembly_root.clone(),
            game_dir: app_dir.join(GAME_DIR),
            app_dir,
            archive_dir,
        }
    }
}

/// Everything done before bundling
#[derive(Debug)]
pub struct AssemblyReport {
    pub tree: PackageTree,
    pub files_copied: u64,
    pub plan: LinkPlan,
    pub links: MaterializeReport,
    pub icon: IconSource,
}

/// Result of a full run
#[derive(Debug)]
pub struct BuildResult {
    pub assembly: AssemblyReport,
    /// `None` when the build was declined
    pub bundle: Option<BundleOutcome>,
    pub cleaned_up: bool,
}

impl BuildResult {
    pub fn exit_code(&self) -> u8 {
        self.bundle.as_ref().map_or(0, BundleOutcome::exit_code)
    }
}

// ============================================================================
// Assembler
// ============================================================================

pub struct PackageAssembler<'a> {
    config: &'a Configuration,
}

impl<'a> PackageAssembler<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Assemble the AppDir without bundling it.
    pub fn prepare(&self) -> Result<AssemblyReport, PackError> {
        let config = self.config;
        let tree = PackageTree::new(config);

        log_action(&format!(
            "Copying game files: {} -> {}",
            config.source_dir.display(),
            tree.game_dir.display()
        ));
        ensure_disposable(&tree.assembly_root)?;
        remove_existing(&tree.assembly_root)
            .map_err(|e| PackError::io("failed to clear build directory", &tree.assembly_root, e))?;
        fs::create_dir_all(&tree.game_dir)
            .map_err(|e| PackError::io("failed to create AppDir", &tree.game_dir, e))?;
        if let Some(archive) = &tree.archive_dir {
            fs::create_dir_all(archive).map_err(|e| PackError::io("failed to create archive mount area", archive, e))?;
        }

        let skip = tree
            .assembly_root
            .starts_with(&config.source_dir)
            .then_some(tree.assembly_root.as_path());
        let files_copied = copy_dir_all(&config.source_dir, &tree.game_dir, skip).map_err(|source| PackError::Copy {
            path: config.source_dir.clone(),
            source,
        })?;
        log_info(&format!("Copied {} files", files_copied));

        let plan = planner::plan(config, &config.source_dir);
        let store_dir = config.app_store_dir();
        log_action(&format!(
            "Redirecting {} save location(s) to {}",
            plan.len(),
            store_dir.display()
        ));
        for entry in &plan {
            log_info(&format!("  {}", entry));
        }
        let links = LinkMaterializer::probe(&tree.game_dir, &store_dir).materialize_plan(&plan);
        log_info(&format!(
            "Linked {}, copied {}, skipped {}, failed {}",
            links.linked,
            links.copied,
            links.skipped,
            links.failures.len()
        ));

        ScriptGenerator::write_app_run(config, &tree.app_dir)
            .map_err(|e| PackError::io("failed to write launcher", tree.app_dir.join(crate::scripts::APP_RUN), e))?;
        ScriptGenerator::write_desktop_entry(config, &tree.app_dir)
            .map_err(|e| PackError::io("failed to write desktop entry", &tree.app_dir, e))?;
        let icon = create_icon(&tree.app_dir, &config.app_name, config.icon.as_deref());

        Ok(AssemblyReport {
            tree,
            files_copied,
            plan,
            links,
            icon,
        })
    }

    /// Assemble, bundle on confirmation, clean up on confirmation.
    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<BuildResult, PackError> {
        let config = self.config;
        let assembly = self.prepare()?;

        let build = config.auto_build || config.force || prompter.confirm("Build AppImage?", true);
        let mut cleaned_up = false;
        let bundle = if build {
            let outcome = run_bundler(config);
            if outcome.is_built() {
                cleaned_up = self.cleanup(prompter, &assembly.tree.assembly_root);
            }
            Some(outcome)
        } else {
            log_info(&format!("AppDir left at {}", assembly.tree.app_dir.display()));
            None
        };

        for line in summary_lines(config) {
            log_info(&line);
        }

        Ok(BuildResult {
            assembly,
            bundle,
            cleaned_up,
        })
    }

    fn cleanup(&self, prompter: &mut dyn Prompter, assembly_root: &Path) -> bool {
        if keep_build_dir() {
            log_info("AGAMEPACK_KEEP_BUILD is set, keeping the build directory");
            return false;
        }
        if !(self.config.force || prompter.confirm("Remove build directory?", true)) {
            return false;
        }
        match fs::remove_dir_all(assembly_root) {
            Ok(()) => {
                log_info("Build directory removed");
                true
            }
            Err(e) => {
                log_warning(&format!("Could not remove {}: {}", assembly_root.display(), e));
                false
            }
        }
    }
}

/// Refuse to wipe an assembly root holding anything but earlier build output.
fn ensure_disposable(assembly_root: &Path) -> Result<(), PackError> {
    let read_err = |e: io::Error| PackError::io("failed to read build directory", assembly_root, e);
    let entries = match fs::read_dir(assembly_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(read_err(e)),
    };
    for entry in entries {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !BUILD_OUTPUT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return Err(ValidationError::AssemblyRootInUse {
                assembly_root: assembly_root.to_path_buf(),
                entry: entry.path(),
            }
            .into());
        }
    }
    Ok(())
}

/// Where saves live and how they are redirected.
pub fn summary_lines(config: &Configuration) -> Vec<String> {
    let store = config.app_store_dir();
    let files: Vec<String> = config
        .root_save_files
        .iter()
        .map(|f| f.display().to_string())
        .collect();

    let mut lines = Vec::new();
    match &config.runtime {
        Runtime::WebHosted => {
            lines.push(format!("Save location: {}", store.display()));
        }
        Runtime::NativeBinaryHosted { .. } => {
            lines.push(format!("Archive directory: {}", store.display()));
            if let Some(dir) = &config.save_dir {
                lines.push(format!("Directory redirect: {}/", dir.display()));
            }
            if config.save_dir.is_none() && files.is_empty() {
                lines.push(format!(
                    "Save pattern: {} ({}-{})",
                    config.save_pattern, config.save_start, config.save_end
                ));
            }
        }
    }
    if !files.is_empty() {
        lines.push(format!("Root save files: {}", files.join(", ")));
    }
    lines
}
