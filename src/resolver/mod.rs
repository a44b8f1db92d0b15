//! Configuration resolution
//!
//! Turns command line parameters, wizard answers, game tree detection and
//! persisted settings into one immutable [`Configuration`]. Every field is
//! resolved through a [`Chain`] (explicit > interactive > detected >
//! default) and the result is validated before anything touches disk.

mod chain;
mod naming;

pub use chain::{Chain, Provenance, Resolved};
pub use naming::{absolutize, output_name_from_app, with_package_suffix, FALLBACK_OUTPUT_STEM, PACKAGE_SUFFIX};

use std::path::{Path, PathBuf};

use crate::classifier::{self, RuntimeFamily};
use crate::config::AppSettings;
use crate::error::ValidationError;
use crate::logging::{log_info, log_warning};
use crate::planner::{web_save_points, SavePattern};

use naming::{dedupe_preserving_order, game_relative, validate_app_name};

/// Directories tried (in order, under the working directory) when no game
/// directory was given
pub const SOURCE_DIR_CANDIDATES: &[&str] = &["game", "dist", "build", "www"];

pub const DEFAULT_SAVE_PATTERN: &str = "Save%d";
pub const DEFAULT_SAVE_START: i64 = 1;
pub const DEFAULT_SAVE_END: i64 = 10;

/// Most numbered save slots one pattern may redirect
pub const MAX_SAVE_SLOTS: u64 = 10_000;

/// Assembly root, relative to the working directory
pub const DEFAULT_ASSEMBLY_DIR: &str = "build";

// ============================================================================
// Types
// ============================================================================

/// Runtime family plus the data only that family needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runtime {
    WebHosted,
    NativeBinaryHosted {
        /// Windows executable, relative to the game directory
        executable: PathBuf,
    },
}

impl Runtime {
    pub fn family(&self) -> RuntimeFamily {
        match self {
            Runtime::WebHosted => RuntimeFamily::WebHosted,
            Runtime::NativeBinaryHosted { .. } => RuntimeFamily::NativeBinaryHosted,
        }
    }

    pub fn executable(&self) -> Option<&Path> {
        match self {
            Runtime::WebHosted => None,
            Runtime::NativeBinaryHosted { executable } => Some(executable),
        }
    }
}

/// Fully resolved packaging parameters for one run
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Absolute path of the game tree being packaged
    pub source_dir: PathBuf,
    pub app_name: String,
    pub icon: Option<PathBuf>,
    pub runtime: Runtime,
    /// Save files relative to the game root, in the order given
    pub root_save_files: Vec<PathBuf>,
    /// Directory redirected as a whole (native-binary-hosted only)
    pub save_dir: Option<PathBuf>,
    pub save_pattern: SavePattern,
    pub save_start: i64,
    pub save_end: i64,
    /// Package file name, always ending in [`PACKAGE_SUFFIX`]
    pub output_name: String,
    pub auto_build: bool,
    pub force: bool,
    pub save_root: PathBuf,
    pub archive_root: PathBuf,
    pub wine_cmd: String,
    pub nwjs_path: PathBuf,
    pub appimagetool: Option<PathBuf>,
    pub assembly_root: PathBuf,
    pub output_dir: PathBuf,
}

impl Configuration {
    pub fn family(&self) -> RuntimeFamily {
        self.runtime.family()
    }

    /// Persistent store root for this runtime family.
    pub fn store_root(&self) -> &Path {
        match self.family() {
            RuntimeFamily::WebHosted => &self.save_root,
            RuntimeFamily::NativeBinaryHosted => &self.archive_root,
        }
    }

    /// Persistent directory holding this application's saves.
    pub fn app_store_dir(&self) -> PathBuf {
        self.store_root().join(&self.app_name)
    }

    pub fn app_dir_name(&self) -> String {
        format!("{}.AppDir", self.app_name)
    }
}

/// One provider's worth of parameters (command line or wizard). Every
/// field is optional; empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    pub source_dir: Option<PathBuf>,
    pub app_name: Option<String>,
    pub icon: Option<PathBuf>,
    pub runtime: Option<String>,
    pub executable: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub root_save_files: Vec<PathBuf>,
    pub save_pattern: Option<String>,
    pub save_start: Option<i64>,
    pub save_end: Option<i64>,
    pub output_name: Option<String>,
    pub save_root: Option<PathBuf>,
    pub archive_root: Option<PathBuf>,
    pub wine_cmd: Option<String>,
    pub nwjs_path: Option<PathBuf>,
    pub appimagetool: Option<PathBuf>,
    pub assembly_root: Option<PathBuf>,
}

impl ParamSet {
    fn root_save_files(&self) -> Option<Vec<PathBuf>> {
        let files: Vec<PathBuf> = self
            .root_save_files
            .iter()
            .filter(|p| !p.as_os_str().is_empty())
            .cloned()
            .collect();
        (!files.is_empty()).then_some(files)
    }
}

/// Confirmation switches, only ever given on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Build without asking
    pub auto_build: bool,
    /// Skip every confirmation
    pub force: bool,
}

// ============================================================================
// Resolver
// ============================================================================

pub struct ConfigResolver<'a> {
    settings: &'a AppSettings,
    working_dir: PathBuf,
    explicit: ParamSet,
    interactive: Option<ParamSet>,
    flags: BuildFlags,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(settings: &'a AppSettings, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            working_dir: working_dir.into(),
            explicit: ParamSet::default(),
            interactive: None,
            flags: BuildFlags::default(),
        }
    }

    pub fn explicit(mut self, params: ParamSet) -> Self {
        self.explicit = params;
        self
    }

    pub fn interactive(mut self, answers: Option<ParamSet>) -> Self {
        self.interactive = answers;
        self
    }

    pub fn flags(mut self, flags: BuildFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Resolve and validate every field.
    pub fn resolve(self) -> Result<Configuration, ValidationError> {
        let cwd = self.working_dir.as_path();
        let explicit = &self.explicit;
        let wizard = self.interactive.clone().unwrap_or_default();

        let mut sources: Vec<(&str, Provenance)> = Vec::new();

        // Game directory
        let source = Chain::new()
            .explicit(non_empty_path(&explicit.source_dir))
            .interactive(non_empty_path(&wizard.source_dir))
            .detected(|| {
                SOURCE_DIR_CANDIDATES
                    .iter()
                    .map(|c| cwd.join(c))
                    .find(|p| p.is_dir())
            })
            .resolve_or(cwd.to_path_buf());
        let source_dir = absolutize(cwd, &source.value);
        sources.push(("game directory", source.provenance));
        if source.provenance >= Provenance::Detected {
            log_info(&format!("Using game directory: {}", source_dir.display()));
        }
        if !source_dir.exists() {
            return Err(ValidationError::SourceMissing(source_dir));
        }
        if !source_dir.is_dir() {
            return Err(ValidationError::SourceNotDirectory(source_dir));
        }

        // Application name
        let app_name = Chain::new()
            .explicit(non_empty(&explicit.app_name))
            .interactive(non_empty(&wizard.app_name))
            .detected(|| {
                source_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .resolve()
            .ok_or(ValidationError::EmptyAppName)?;
        sources.push(("name", app_name.provenance));
        if app_name.provenance == Provenance::Detected {
            log_info(&format!("Using directory name as application name: {}", app_name.value));
        }
        let app_name = app_name.value;
        validate_app_name(&app_name)?;

        // Runtime family
        let family = Chain::new()
            .explicit(non_empty(&explicit.runtime).map(|s| s.parse::<RuntimeFamily>()))
            .interactive(non_empty(&wizard.runtime).map(|s| s.parse::<RuntimeFamily>()))
            .detected(|| classifier::detect_family(&source_dir).map(Ok))
            .resolve_or(Ok(RuntimeFamily::WebHosted));
        sources.push(("type", family.provenance));
        match family.provenance {
            Provenance::Detected => log_info(&format!(
                "Detected game type: {}",
                family.value.as_ref().map_or("?", |f| f.display_name())
            )),
            Provenance::Default => log_warning("Could not determine the game type, defaulting to NW.js"),
            _ => {}
        }
        let family = family.value?;

        let runtime = match family {
            RuntimeFamily::WebHosted => Runtime::WebHosted,
            RuntimeFamily::NativeBinaryHosted => {
                let executable = Chain::new()
                    .explicit(non_empty_path(&explicit.executable))
                    .interactive(non_empty_path(&wizard.executable))
                    .detected(|| classifier::list_executables(&source_dir).into_iter().next())
                    .resolve()
                    .ok_or_else(|| ValidationError::MissingExecutable(source_dir.clone()))?;
                let exe = game_relative(&executable.value)?;
                sources.push(("executable", executable.provenance));
                if executable.provenance == Provenance::Detected {
                    log_info(&format!("Detected executable: {}", exe.display()));
                } else if !source_dir.join(&exe).is_file() {
                    log_warning(&format!(
                        "Executable {} does not exist in {}",
                        exe.display(),
                        source_dir.display()
                    ));
                }
                Runtime::NativeBinaryHosted { executable: exe }
            }
        };

        // Save topology
        let save_dir = Chain::new()
            .explicit(non_empty_path(&explicit.save_dir))
            .interactive(non_empty_path(&wizard.save_dir))
            .resolve()
            .map(|r| game_relative(&r.value))
            .transpose()?;
        if save_dir.is_some() && family == RuntimeFamily::WebHosted {
            log_warning("Save directory redirection only applies to Wine games; ignoring it");
        }
        let save_dir = save_dir.filter(|_| family == RuntimeFamily::NativeBinaryHosted);

        let listed = Chain::new()
            .explicit(explicit.root_save_files())
            .interactive(wizard.root_save_files())
            .resolve_or(Vec::new())
            .value;
        let listed = listed
            .iter()
            .map(|p| game_relative(p))
            .collect::<Result<Vec<_>, _>>()?;
        let (root_save_files, duplicates) = dedupe_preserving_order(listed);
        for dup in duplicates {
            log_warning(&format!("Save file {} listed more than once", dup.display()));
        }

        let directories: Vec<PathBuf> = match family {
            RuntimeFamily::NativeBinaryHosted => save_dir.iter().cloned().collect(),
            RuntimeFamily::WebHosted => web_save_points(&source_dir),
        };
        check_overlaps(&directories, &root_save_files)?;

        let pattern = Chain::new()
            .explicit(non_empty(&explicit.save_pattern))
            .interactive(non_empty(&wizard.save_pattern))
            .resolve_or(DEFAULT_SAVE_PATTERN.to_string());
        let save_pattern = SavePattern::parse(&pattern.value)?;
        let save_start = Chain::new()
            .explicit(explicit.save_start)
            .interactive(wizard.save_start)
            .resolve_or(DEFAULT_SAVE_START)
            .value;
        let save_end = Chain::new()
            .explicit(explicit.save_end)
            .interactive(wizard.save_end)
            .resolve_or(DEFAULT_SAVE_END)
            .value;
        if save_end >= save_start && save_end.abs_diff(save_start) >= MAX_SAVE_SLOTS {
            return Err(ValidationError::SaveRangeTooLarge {
                start: save_start,
                end: save_end,
                max: MAX_SAVE_SLOTS,
            });
        }

        // Output
        let output = Chain::new()
            .explicit(non_empty(&explicit.output_name).map(|n| with_package_suffix(&n)))
            .interactive(non_empty(&wizard.output_name).map(|n| with_package_suffix(&n)))
            .resolve_or(output_name_from_app(&app_name));
        sources.push(("output", output.provenance));
        if output.provenance == Provenance::Default {
            log_info(&format!("Using default file name: {}", output.value));
        }
        let output_name = output.value;
        if output_name.contains('/') {
            return Err(ValidationError::InvalidOutputName(output_name));
        }

        let icon = Chain::new()
            .explicit(non_empty_path(&explicit.icon))
            .interactive(non_empty_path(&wizard.icon))
            .resolve()
            .map(|r| absolutize(cwd, &r.value));

        // Tool settings
        let settings = self.settings;
        let save_root = Chain::new()
            .explicit(non_empty_path(&explicit.save_root))
            .interactive(non_empty_path(&wizard.save_root))
            .resolve_or(settings.save_root.clone())
            .value;
        let save_root = absolutize(cwd, &save_root);
        let archive_root = Chain::new()
            .explicit(non_empty_path(&explicit.archive_root))
            .interactive(non_empty_path(&wizard.archive_root))
            .resolve_or(settings.archive_root.clone())
            .value;
        let archive_root = absolutize(cwd, &archive_root);
        let wine_cmd = Chain::new()
            .explicit(non_empty(&explicit.wine_cmd))
            .interactive(non_empty(&wizard.wine_cmd))
            .resolve_or(settings.wine_cmd.clone())
            .value;
        let nwjs_path = Chain::new()
            .explicit(non_empty_path(&explicit.nwjs_path))
            .interactive(non_empty_path(&wizard.nwjs_path))
            .resolve_or(settings.nwjs_path.clone())
            .value;
        let appimagetool = non_empty_path(&explicit.appimagetool)
            .or_else(|| settings.appimagetool.clone())
            .map(|p| absolutize(cwd, &p));

        let assembly_root = absolutize(
            cwd,
            &non_empty_path(&explicit.assembly_root).unwrap_or_else(|| PathBuf::from(DEFAULT_ASSEMBLY_DIR)),
        );
        if source_dir.starts_with(&assembly_root) {
            return Err(ValidationError::AssemblyRootContainsSource {
                assembly_root,
                source_dir,
            });
        }
        // The assembly root is wiped recursively before every build
        let home = dirs::home_dir();
        let protected = [Some(cwd), home.as_deref(), Some(save_root.as_path()), Some(archive_root.as_path())];
        if let Some(path) = protected.into_iter().flatten().find(|p| p.starts_with(&assembly_root)) {
            return Err(ValidationError::AssemblyRootContainsProtected {
                protected: path.to_path_buf(),
                assembly_root,
            });
        }

        let sources: Vec<String> = sources
            .iter()
            .map(|(field, provenance)| format!("{} ({})", field, provenance))
            .collect();
        log_info(&format!("Resolved {}", sources.join(", ")));

        Ok(Configuration {
            source_dir,
            app_name,
            icon,
            runtime,
            root_save_files,
            save_dir,
            save_pattern,
            save_start,
            save_end,
            output_name,
            auto_build: self.flags.auto_build,
            force: self.flags.force,
            save_root,
            archive_root,
            wine_cmd,
            nwjs_path: absolutize(cwd, &nwjs_path),
            appimagetool,
            assembly_root,
            output_dir: cwd.to_path_buf(),
        })
    }
}

// ============================================================================
// Internal Functions
// ============================================================================

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_empty_path(value: &Option<PathBuf>) -> Option<PathBuf> {
    value.clone().filter(|p| !p.as_os_str().is_empty())
}

/// Redirected directories and redirected files must not contain each other:
/// a link inside a link would be written through the outer one.
fn check_overlaps(directories: &[PathBuf], files: &[PathBuf]) -> Result<(), ValidationError> {
    for dir in directories {
        for file in files {
            if file.starts_with(dir) || dir.starts_with(file) {
                return Err(ValidationError::OverlappingRedirects {
                    directory: dir.clone(),
                    file: file.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A resolved-looking configuration without touching the filesystem.
    pub fn config_for(source: &Path, runtime: Runtime) -> Configuration {
        Configuration {
            source_dir: source.to_path_buf(),
            app_name: "TestGame".to_string(),
            icon: None,
            runtime,
            root_save_files: Vec::new(),
            save_dir: None,
            save_pattern: SavePattern::parse(DEFAULT_SAVE_PATTERN).unwrap(),
            save_start: DEFAULT_SAVE_START,
            save_end: DEFAULT_SAVE_END,
            output_name: "TestGame.AppImage".to_string(),
            auto_build: false,
            force: false,
            save_root: PathBuf::from("/nonexistent/saves"),
            archive_root: PathBuf::from("/nonexistent/archive"),
            wine_cmd: "proton-ge".to_string(),
            nwjs_path: PathBuf::from("/nonexistent/nw"),
            appimagetool: None,
            assembly_root: source.join("../build"),
            output_dir: source.join(".."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct Fixture {
        cwd: tempfile::TempDir,
        settings: AppSettings,
    }

    impl Fixture {
        fn new() -> Self {
            let cwd = tempfile::tempdir().unwrap();
            let settings = AppSettings {
                save_root: cwd.path().join("store/saves"),
                archive_root: cwd.path().join("store/archive"),
                ..AppSettings::default()
            };
            Self { cwd, settings }
        }

        fn game(&self, name: &str, files: &[&str]) -> PathBuf {
            let dir = self.cwd.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            for f in files {
                let path = dir.join(f);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, b"x").unwrap();
            }
            dir
        }

        fn resolve(&self, explicit: ParamSet) -> Result<Configuration, ValidationError> {
            ConfigResolver::new(&self.settings, self.cwd.path())
                .explicit(explicit)
                .resolve()
        }
    }

    fn params(source: &Path) -> ParamSet {
        ParamSet {
            source_dir: Some(source.to_path_buf()),
            ..ParamSet::default()
        }
    }

    #[test]
    fn package_json_is_detected_as_web() {
        let fx = Fixture::new();
        let game = fx.game("mygame", &["package.json", "js/main.js"]);

        let config = fx.resolve(params(&game)).unwrap();
        assert_eq!(config.runtime, Runtime::WebHosted);
        assert_eq!(config.app_name, "mygame");
        assert_eq!(config.output_name, "mygame.AppImage");
        assert_eq!(config.store_root(), fx.settings.save_root.as_path());
    }

    #[test]
    fn lone_exe_is_detected_as_native_with_executable() {
        let fx = Fixture::new();
        let game = fx.game("oldgame", &["game.exe"]);

        let config = fx.resolve(params(&game)).unwrap();
        assert_eq!(
            config.runtime,
            Runtime::NativeBinaryHosted {
                executable: PathBuf::from("game.exe")
            }
        );
        assert_eq!(config.app_store_dir(), fx.settings.archive_root.join("oldgame"));
    }

    #[test]
    fn undecidable_tree_defaults_to_web() {
        let fx = Fixture::new();
        let game = fx.game("assets", &["readme.txt"]);
        assert_eq!(fx.resolve(params(&game)).unwrap().runtime, Runtime::WebHosted);
    }

    #[test]
    fn explicit_type_overrides_detection() {
        let fx = Fixture::new();
        let game = fx.game("hybrid", &["index.html", "bin/Game.exe"]);

        let config = fx
            .resolve(ParamSet {
                runtime: Some("wine".to_string()),
                ..params(&game)
            })
            .unwrap();
        assert_eq!(config.runtime.executable(), Some(Path::new("bin/Game.exe")));
    }

    #[test]
    fn explicit_beats_interactive() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);

        let config = ConfigResolver::new(&fx.settings, fx.cwd.path())
            .explicit(ParamSet {
                app_name: Some("FromFlag".to_string()),
                ..params(&game)
            })
            .interactive(Some(ParamSet {
                app_name: Some("FromWizard".to_string()),
                output_name: Some("wizard-out".to_string()),
                ..ParamSet::default()
            }))
            .resolve()
            .unwrap();
        assert_eq!(config.app_name, "FromFlag");
        assert_eq!(config.output_name, "wizard-out.AppImage");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        let err = fx
            .resolve(ParamSet {
                runtime: Some("flash".to_string()),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownRuntime(t) if t == "flash"));
    }

    #[test]
    fn wine_without_executable_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["data.bin"]);
        let err = fx
            .resolve(ParamSet {
                runtime: Some("wine".to_string()),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingExecutable(_)));
    }

    #[test]
    fn missing_source_is_rejected() {
        let fx = Fixture::new();
        let err = fx.resolve(params(Path::new("does-not-exist"))).unwrap_err();
        assert!(matches!(err, ValidationError::SourceMissing(p) if p.ends_with("does-not-exist")));
    }

    #[test]
    fn file_as_source_is_rejected() {
        let fx = Fixture::new();
        fs::write(fx.cwd.path().join("game.zip"), b"zip").unwrap();
        let err = fx.resolve(params(Path::new("game.zip"))).unwrap_err();
        assert!(matches!(err, ValidationError::SourceNotDirectory(_)));
    }

    #[test]
    fn source_dir_is_detected_from_candidates() {
        let fx = Fixture::new();
        fx.game("dist", &["index.html"]);

        let config = fx.resolve(ParamSet::default()).unwrap();
        assert_eq!(config.source_dir, fx.cwd.path().join("dist"));
        assert_eq!(config.app_name, "dist");
    }

    #[test]
    fn relative_source_dir_is_made_absolute() {
        let fx = Fixture::new();
        fx.game("mygame", &["index.html"]);

        let config = fx.resolve(params(Path::new("./mygame/"))).unwrap();
        assert_eq!(config.source_dir, fx.cwd.path().join("mygame"));
        assert_eq!(config.assembly_root, fx.cwd.path().join("build"));
        assert_eq!(config.output_dir, fx.cwd.path());
    }

    #[test]
    fn output_name_always_carries_suffix() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        for (given, expected) in [
            (None, "g.AppImage"),
            (Some("Custom"), "Custom.AppImage"),
            (Some("Custom.AppImage"), "Custom.AppImage"),
        ] {
            let config = fx
                .resolve(ParamSet {
                    output_name: given.map(str::to_string),
                    ..params(&game)
                })
                .unwrap();
            assert_eq!(config.output_name, expected);
            assert!(config.output_name.ends_with(PACKAGE_SUFFIX));
        }
    }

    #[test]
    fn output_name_with_directory_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        let err = fx
            .resolve(ParamSet {
                output_name: Some("out/G".to_string()),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidOutputName(_)));
    }

    #[test]
    fn overlapping_native_redirects_are_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let err = fx
            .resolve(ParamSet {
                save_dir: Some("save".into()),
                root_save_files: vec!["save/slot1.dat".into()],
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingRedirects { .. }));
    }

    #[test]
    fn hybrid_native_redirects_are_accepted() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let config = fx
            .resolve(ParamSet {
                save_dir: Some("save/".into()),
                root_save_files: vec!["saves.dat".into(), "config.ini".into()],
                ..params(&game)
            })
            .unwrap();
        assert_eq!(config.save_dir, Some(PathBuf::from("save")));
        assert_eq!(config.root_save_files.len(), 2);
    }

    #[test]
    fn web_files_inside_save_dir_are_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["package.json", "www/index.html"]);
        let err = fx
            .resolve(ParamSet {
                root_save_files: vec!["www/save/global.rpgsave".into()],
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OverlappingRedirects { directory, .. } if directory == Path::new("www/save")
        ));
    }

    #[test]
    fn escaping_save_paths_are_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let err = fx
            .resolve(ParamSet {
                root_save_files: vec!["../outside.dat".into()],
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGamePath { .. }));
    }

    #[test]
    fn duplicate_save_files_collapse() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let config = fx
            .resolve(ParamSet {
                root_save_files: vec!["a.dat".into(), "./a.dat".into(), "b.dat".into()],
                ..params(&game)
            })
            .unwrap();
        assert_eq!(
            config.root_save_files,
            vec![PathBuf::from("a.dat"), PathBuf::from("b.dat")]
        );
    }

    #[test]
    fn bad_save_pattern_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let err = fx
            .resolve(ParamSet {
                save_pattern: Some("Save%s".to_string()),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSavePattern { .. }));
    }

    #[test]
    fn pattern_defaults_apply() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let config = fx.resolve(params(&game)).unwrap();
        assert_eq!(config.save_pattern.as_str(), DEFAULT_SAVE_PATTERN);
        assert_eq!((config.save_start, config.save_end), (1, 10));
    }

    #[test]
    fn build_dir_above_source_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("build/game", &["index.html"]);
        let err = fx.resolve(params(&game)).unwrap_err();
        assert!(matches!(err, ValidationError::AssemblyRootContainsSource { .. }));
    }

    #[test]
    fn escaping_save_pattern_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let outside = fx.cwd.path().join("victim%d");
        for pattern in [outside.to_string_lossy().into_owned(), "../x%d".to_string()] {
            let err = fx
                .resolve(ParamSet {
                    save_pattern: Some(pattern.clone()),
                    ..params(&game)
                })
                .unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidSavePattern { .. }),
                "{pattern} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_save_range_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let err = fx
            .resolve(ParamSet {
                save_start: Some(1),
                save_end: Some(1_000_000_000),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::SaveRangeTooLarge { .. }));

        let config = fx
            .resolve(ParamSet {
                save_start: Some(1),
                save_end: Some(MAX_SAVE_SLOTS as i64),
                ..params(&game)
            })
            .unwrap();
        assert_eq!(config.save_end, MAX_SAVE_SLOTS as i64);
    }

    #[test]
    fn reversed_save_range_is_accepted() {
        let fx = Fixture::new();
        let game = fx.game("g", &["game.exe"]);
        let config = fx
            .resolve(ParamSet {
                save_start: Some(5),
                save_end: Some(i64::MIN),
                ..params(&game)
            })
            .unwrap();
        assert_eq!((config.save_start, config.save_end), (5, i64::MIN));
    }

    #[test]
    fn build_dir_over_working_directory_is_rejected() {
        let fx = Fixture::new();
        let elsewhere = tempfile::tempdir().unwrap();
        fs::write(elsewhere.path().join("index.html"), b"x").unwrap();

        for build_dir in [PathBuf::from("."), fx.cwd.path().to_path_buf()] {
            let err = fx
                .resolve(ParamSet {
                    assembly_root: Some(build_dir.clone()),
                    ..params(elsewhere.path())
                })
                .unwrap_err();
            assert!(
                matches!(err, ValidationError::AssemblyRootContainsProtected { .. }),
                "{} should be rejected",
                build_dir.display()
            );
        }
    }

    #[test]
    fn build_dir_over_home_is_rejected() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        let err = fx
            .resolve(ParamSet {
                assembly_root: Some(home),
                ..params(&game)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AssemblyRootContainsProtected { .. } | ValidationError::AssemblyRootContainsSource { .. }
        ));
    }

    #[test]
    fn build_dir_over_save_store_is_rejected() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        let err = fx
            .resolve(ParamSet {
                assembly_root: Some(fx.cwd.path().join("store")),
                ..params(&game)
            })
            .unwrap_err();
        match err {
            ValidationError::AssemblyRootContainsProtected { protected, .. } => {
                assert_eq!(protected, fx.cwd.path().join("store/saves"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn flags_are_carried_through() {
        let fx = Fixture::new();
        let game = fx.game("g", &["index.html"]);
        let config = ConfigResolver::new(&fx.settings, fx.cwd.path())
            .explicit(params(&game))
            .flags(BuildFlags { auto_build: true, force: false })
            .resolve()
            .unwrap();
        assert!(config.auto_build);
        assert!(!config.force);
    }
}
