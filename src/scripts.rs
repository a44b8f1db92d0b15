//! Launcher and desktop entry generation
//!
//! Both files are pure functions of the [`Configuration`]: rebuilding with
//! the same configuration produces byte-identical output.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::resolver::{Configuration, Runtime};

/// Launcher name inside the AppDir
pub const APP_RUN: &str = "AppRun";

/// Runner used when the configured one is not on PATH
pub const FALLBACK_WINE_CMD: &str = "wine";

/// Web runtime looked up on PATH when the configured one is missing
pub const FALLBACK_NWJS_CMD: &str = "nw";

pub struct ScriptGenerator;

impl ScriptGenerator {
    /// `AppRun` contents for `config`.
    pub fn app_run(config: &Configuration) -> String {
        match &config.runtime {
            Runtime::NativeBinaryHosted { executable } => {
                let save_dir = config
                    .save_dir
                    .as_ref()
                    .map(|d| d.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!(
                    r#"#!/bin/bash
# AGamePack launcher (Wine)
APPDIR="$(dirname "$(readlink -f "$0")")"
APP_NAME={app}

# Persistent save archive
WINE_ARCHIVE_DIR={archive}/"$APP_NAME"
mkdir -p "$WINE_ARCHIVE_DIR" 2>/dev/null || true

SAVE_SUBDIR={save_dir}
if [ -n "$SAVE_SUBDIR" ]; then
    mkdir -p "$WINE_ARCHIVE_DIR/$SAVE_SUBDIR" 2>/dev/null || true
fi

WINE_CMD={wine}
if ! command -v "$WINE_CMD" >/dev/null 2>&1; then
    WINE_CMD={fallback}
fi

cd "$APPDIR/game" || exit 1
exec "$WINE_CMD" {exe} "$@"
"#,
                    app = shell_quote(&config.app_name),
                    archive = shell_quote_path(&config.archive_root),
                    save_dir = shell_quote(&save_dir),
                    wine = shell_quote(&config.wine_cmd),
                    fallback = FALLBACK_WINE_CMD,
                    exe = shell_quote_path(executable),
                )
            }
            Runtime::WebHosted => format!(
                r#"#!/bin/bash
# AGamePack launcher (NW.js)
APPDIR="$(dirname "$(readlink -f "$0")")"
APP_NAME={app}

# Persistent save directory
SAVE_DIR={save_root}/"$APP_NAME"
mkdir -p "$SAVE_DIR"

NWJS_PATH={nwjs}
if [ ! -x "$NWJS_PATH" ]; then
    NWJS_PATH="$(command -v {fallback} 2>/dev/null || echo {fallback})"
fi

cd "$APPDIR/game" || exit 1
exec "$NWJS_PATH" . --no-sandbox "$@"
"#,
                app = shell_quote(&config.app_name),
                save_root = shell_quote_path(&config.save_root),
                nwjs = shell_quote_path(&config.nwjs_path),
                fallback = FALLBACK_NWJS_CMD,
            ),
        }
    }

    /// `<App>.desktop` contents for `config`.
    pub fn desktop_entry(config: &Configuration) -> String {
        format!(
            "[Desktop Entry]\n\
             Name={name}\n\
             Exec={APP_RUN}\n\
             Icon={name}\n\
             Terminal=false\n\
             Type=Application\n\
             Categories=Game;\n",
            name = config.app_name,
        )
    }

    /// Write `AppRun` into `app_dir` with mode 0755.
    pub fn write_app_run(config: &Configuration, app_dir: &Path) -> io::Result<PathBuf> {
        let path = app_dir.join(APP_RUN);
        write_file(&path, &Self::app_run(config), 0o755)?;
        Ok(path)
    }

    /// Write `<App>.desktop` into `app_dir`.
    pub fn write_desktop_entry(config: &Configuration, app_dir: &Path) -> io::Result<PathBuf> {
        let path = app_dir.join(format!("{}.desktop", config.app_name));
        write_file(&path, &Self::desktop_entry(config), 0o644)?;
        Ok(path)
    }
}

fn write_file(path: &Path, content: &str, mode: u32) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    fs::set_permissions(path, perms)
}

/// Single-quote a value for bash.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn shell_quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}
