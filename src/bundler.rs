//! appimagetool invocation
//!
//! The bundler runs inside the assembly root as
//! `appimagetool <App>.AppDir <output name>`, then the artifact is moved to
//! the output directory. A missing tool or a failed run is reported with a
//! manual command; neither is an error of the packaging itself.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::Duration;

use crate::logging::{log_action, log_build, log_error, log_info, log_warning};
use crate::resolver::Configuration;
use crate::tools::locate_tool;

pub const APPIMAGETOOL: &str = "appimagetool";

/// Checked when appimagetool is neither configured nor on PATH
pub const APPIMAGETOOL_FALLBACKS: &[&str] = &["/usr/bin/appimagetool", "/usr/local/bin/appimagetool"];

const BUNDLE_ENV: &[(&str, &str)] = &[("ARCH", "x86_64"), ("APPIMAGE_EXTRACT_AND_RUN", "1")];

const ETXTBSY: i32 = 26;
const TEXT_BUSY_RETRIES: usize = 5;

#[derive(Debug)]
pub enum BundleOutcome {
    /// The package is at this path
    Built(PathBuf),
    ToolMissing,
    /// The tool ran but did not produce the package
    Failed(String),
    /// The package was built but could not be moved out of the assembly root
    RelocationFailed { artifact: PathBuf, error: io::Error },
}

impl BundleOutcome {
    pub fn is_built(&self) -> bool {
        matches!(self, BundleOutcome::Built(_))
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            BundleOutcome::Built(_) | BundleOutcome::ToolMissing => 0,
            BundleOutcome::Failed(_) | BundleOutcome::RelocationFailed { .. } => 2,
        }
    }
}

pub struct Bundler {
    tool: PathBuf,
}

impl Bundler {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// Find appimagetool: configured path, PATH, then the usual locations.
    pub fn locate(configured: Option<&Path>) -> Option<Self> {
        locate_tool(APPIMAGETOOL, configured, APPIMAGETOOL_FALLBACKS).map(Self::new)
    }

    /// Bundle `config`'s AppDir and move the result to the output directory.
    pub fn bundle(&self, config: &Configuration) -> BundleOutcome {
        let work_dir = &config.assembly_root;
        let app_dir_name = config.app_dir_name();
        let built = work_dir.join(&config.output_name);

        log_build(&format!("Building AppImage: {}", config.output_name));
        log_info(&format!("Working directory: {}", work_dir.display()));
        log_info(&format!(
            "Command: {} {} {}",
            self.tool.display(),
            app_dir_name,
            config.output_name
        ));

        let mut command = Command::new(&self.tool);
        command
            .arg(&app_dir_name)
            .arg(&config.output_name)
            .envs(BUNDLE_ENV.iter().copied())
            .current_dir(work_dir);
        let status = run_status(&mut command);

        let failure = match status {
            Ok(s) if s.success() && built.is_file() => None,
            Ok(s) if s.success() => Some("appimagetool finished but produced no output".to_string()),
            Ok(s) => Some(format!("appimagetool exited with {}", s)),
            Err(e) => Some(format!("failed to run {}: {}", self.tool.display(), e)),
        };
        if let Some(reason) = failure {
            log_error(&format!("Build failed: {}", reason));
            report_diagnostics(config, &built);
            log_info(&manual_command(config, Some(&self.tool)));
            return BundleOutcome::Failed(reason);
        }

        let destination = config.output_dir.join(&config.output_name);
        match relocate(&built, &destination) {
            Ok(()) => {
                log_build(&format!("Build complete: {}", destination.display()));
                BundleOutcome::Built(destination)
            }
            Err(error) => {
                log_error(&format!(
                    "Could not move {} to {}: {}",
                    built.display(),
                    destination.display(),
                    error
                ));
                BundleOutcome::RelocationFailed { artifact: built, error }
            }
        }
    }
}

/// Locate appimagetool and bundle, reporting a missing tool.
pub fn run_bundler(config: &Configuration) -> BundleOutcome {
    match Bundler::locate(config.appimagetool.as_deref()) {
        Some(bundler) => bundler.bundle(config),
        None => {
            log_warning("appimagetool is not installed, the AppDir was not bundled");
            log_info("Install it with your package manager (e.g. `sudo apt-get install appimagetool` or `sudo pacman -S appimagetool`)");
            log_info(&manual_command(config, None));
            BundleOutcome::ToolMissing
        }
    }
}

/// Shell commands that bundle the assembled AppDir by hand.
pub fn manual_command(config: &Configuration, tool: Option<&Path>) -> String {
    let tool = tool.map_or_else(|| APPIMAGETOOL.to_string(), |t| t.display().to_string());
    let env: Vec<String> = BUNDLE_ENV.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!(
        "Build manually with:\n  cd \"{}\"\n  {} {} \"{}\" \"{}\"",
        config.assembly_root.display(),
        env.join(" "),
        tool,
        config.app_dir_name(),
        config.output_name
    )
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Run `command`, retrying while the executable is still open for writing
/// elsewhere (ETXTBSY).
fn run_status(command: &mut Command) -> io::Result<ExitStatus> {
    for _ in 0..TEXT_BUSY_RETRIES {
        match command.status() {
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => thread::sleep(Duration::from_millis(50)),
            other => return other,
        }
    }
    command.status()
}

/// Move `from` to `to` (copy + remove across filesystems) and make it
/// executable.
fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_err() {
        log_action("Rename failed, copying the package instead...");
        fs::copy(from, to)?;
        if let Err(e) = fs::remove_file(from) {
            log_warning(&format!("Could not remove {}: {}", from.display(), e));
        }
    }
    fs::set_permissions(to, fs::Permissions::from_mode(0o755))
}

fn report_diagnostics(config: &Configuration, built: &Path) {
    log_info(&format!("Contents of {}:", config.assembly_root.display()));
    match fs::read_dir(&config.assembly_root) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            for name in names {
                log_info(&format!("  - {}", name));
            }
        }
        Err(e) => log_warning(&format!("  cannot read directory: {}", e)),
    }

    let app_dir = config.assembly_root.join(config.app_dir_name());
    if app_dir.is_dir() {
        log_info(&format!("AppDir present: {}", app_dir.display()));
    } else {
        log_warning(&format!("AppDir missing: {}", app_dir.display()));
    }
    if built.exists() {
        log_info(&format!("Output present: {}", built.display()));
    } else {
        log_warning(&format!("Output missing: {}", built.display()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::config_for;
    use crate::resolver::Runtime;

    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let tool = dir.join("appimagetool");
        fs::write(&tool, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        tool
    }

    fn layout() -> (tempfile::TempDir, Configuration) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(&dir.path().join("src"), Runtime::WebHosted);
        config.assembly_root = dir.path().join("build");
        config.output_dir = dir.path().join("out");
        fs::create_dir_all(config.assembly_root.join(config.app_dir_name())).unwrap();
        fs::create_dir_all(&config.output_dir).unwrap();
        (dir, config)
    }

    #[test]
    fn successful_build_is_moved_and_executable() {
        let (dir, config) = layout();
        // Writes its second argument after checking the environment
        let tool = fake_tool(
            dir.path(),
            r#"[ "$ARCH" = x86_64 ] && [ "$APPIMAGE_EXTRACT_AND_RUN" = 1 ] && [ -d "$1" ] || exit 3
echo bundle > "$2""#,
        );

        let outcome = Bundler::new(tool).bundle(&config);
        let expected = config.output_dir.join("TestGame.AppImage");
        assert!(matches!(&outcome, BundleOutcome::Built(p) if p == &expected));
        assert_eq!(outcome.exit_code(), 0);
        assert!(!config.assembly_root.join("TestGame.AppImage").exists());
        let mode = fs::metadata(&expected).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn failing_tool_is_reported() {
        let (dir, config) = layout();
        let tool = fake_tool(dir.path(), "exit 1");

        let outcome = Bundler::new(tool).bundle(&config);
        assert!(matches!(outcome, BundleOutcome::Failed(_)));
        assert_eq!(outcome.exit_code(), 2);
        assert!(!config.output_dir.join("TestGame.AppImage").exists());
    }

    #[test]
    fn silent_tool_without_output_is_a_failure() {
        let (dir, config) = layout();
        let tool = fake_tool(dir.path(), "exit 0");
        assert!(matches!(Bundler::new(tool).bundle(&config), BundleOutcome::Failed(_)));
    }

    #[test]
    fn unusable_output_dir_is_a_relocation_failure() {
        let (dir, mut config) = layout();
        config.output_dir = dir.path().join("missing/out");
        let tool = fake_tool(dir.path(), r#"echo bundle > "$2""#);

        let outcome = Bundler::new(tool).bundle(&config);
        assert!(matches!(outcome, BundleOutcome::RelocationFailed { .. }));
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn missing_configured_tool_is_not_fatal() {
        let (dir, mut config) = layout();
        config.appimagetool = Some(dir.path().join("not-installed"));

        let outcome = run_bundler(&config);
        assert!(matches!(outcome, BundleOutcome::ToolMissing));
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn manual_command_names_appdir_and_output() {
        let (_dir, config) = layout();
        let cmd = manual_command(&config, None);
        assert!(cmd.contains("ARCH=x86_64 APPIMAGE_EXTRACT_AND_RUN=1 appimagetool \"TestGame.AppDir\" \"TestGame.AppImage\""));
    }
}
