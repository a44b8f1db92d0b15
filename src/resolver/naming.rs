//! Path and file name normalization used while resolving a configuration

use std::path::{Component, Path, PathBuf};

use crate::error::ValidationError;

/// Suffix every package file name carries
pub const PACKAGE_SUFFIX: &str = ".AppImage";

/// Generic file name used when the application name has no usable characters
pub const FALLBACK_OUTPUT_STEM: &str = "Game";

/// Derive a package file name from the application name: keep ASCII
/// letters, digits, `_` and `-`; fall back to [`FALLBACK_OUTPUT_STEM`].
pub fn output_name_from_app(app_name: &str) -> String {
    let clean: String = app_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if clean.is_empty() {
        with_package_suffix(FALLBACK_OUTPUT_STEM)
    } else {
        with_package_suffix(&clean)
    }
}

pub fn with_package_suffix(name: &str) -> String {
    if name.ends_with(PACKAGE_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}", name, PACKAGE_SUFFIX)
    }
}

/// Make `path` absolute against `cwd` and drop `.`/`..` components
/// lexically (the path does not have to exist).
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Check that `path` stays inside the game directory and return it without
/// `.` components or trailing separators.
pub fn game_relative(path: &Path) -> Result<PathBuf, ValidationError> {
    let invalid = |reason| ValidationError::InvalidGamePath {
        path: path.to_path_buf(),
        reason,
    };

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be relative to the game directory"))
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(invalid("must name a file or directory"));
    }
    Ok(out)
}

/// Names usable as a single path component.
pub fn validate_app_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyAppName);
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(ValidationError::InvalidAppName(name.to_string()));
    }
    Ok(())
}

/// Collapse duplicates, keeping the first occurrence.
pub fn dedupe_preserving_order(paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    let mut dropped = Vec::new();
    for path in paths {
        if kept.contains(&path) {
            dropped.push(path);
        } else {
            kept.push(path);
        }
    }
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_keeps_safe_characters() {
        assert_eq!(output_name_from_app("My Game: Deluxe!"), "MyGameDeluxe.AppImage");
        assert_eq!(output_name_from_app("rpg_maker-2"), "rpg_maker-2.AppImage");
        assert_eq!(output_name_from_app("v1.2"), "v12.AppImage");
    }

    #[test]
    fn output_name_falls_back_to_generic() {
        assert_eq!(output_name_from_app("魔法少女"), "Game.AppImage");
        assert_eq!(output_name_from_app(""), "Game.AppImage");
    }

    #[test]
    fn suffix_is_added_once() {
        assert_eq!(with_package_suffix("Foo"), "Foo.AppImage");
        assert_eq!(with_package_suffix("Foo.AppImage"), "Foo.AppImage");
        assert_eq!(with_package_suffix("Foo.appimage"), "Foo.appimage.AppImage");
    }

    #[test]
    fn absolutize_cleans_components() {
        let cwd = Path::new("/home/user/games");
        assert_eq!(absolutize(cwd, Path::new("./")), PathBuf::from("/home/user/games"));
        assert_eq!(absolutize(cwd, Path::new("../other/./x")), PathBuf::from("/home/user/other/x"));
        assert_eq!(absolutize(cwd, Path::new("/opt/g")), PathBuf::from("/opt/g"));
    }

    #[test]
    fn game_relative_rejects_escapes() {
        assert_eq!(game_relative(Path::new("./save/")).unwrap(), PathBuf::from("save"));
        assert_eq!(game_relative(Path::new("data/slot.dat")).unwrap(), PathBuf::from("data/slot.dat"));
        assert!(game_relative(Path::new("../save")).is_err());
        assert!(game_relative(Path::new("/etc/passwd")).is_err());
        assert!(game_relative(Path::new(".")).is_err());
    }

    #[test]
    fn app_name_rules() {
        assert!(validate_app_name("Old Game").is_ok());
        assert!(matches!(validate_app_name(""), Err(ValidationError::EmptyAppName)));
        assert!(matches!(validate_app_name("a/b"), Err(ValidationError::InvalidAppName(_))));
        assert!(matches!(validate_app_name(".."), Err(ValidationError::InvalidAppName(_))));
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let (kept, dropped) = dedupe_preserving_order(vec![
            "a.dat".into(),
            "b.ini".into(),
            "a.dat".into(),
        ]);
        assert_eq!(kept, vec![PathBuf::from("a.dat"), PathBuf::from("b.ini")]);
        assert_eq!(dropped, vec![PathBuf::from("a.dat")]);
    }
}
