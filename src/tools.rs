use std::env;
use std::path::{Path, PathBuf};

/// Reads a boolean environment switch (`1`, `true`, `yes`, `on`).
pub fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name)
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Whether diagnostics should keep the assembly root even when cleanup was
/// requested.
pub fn keep_build_dir() -> bool {
    env_flag("AGAMEPACK_KEEP_BUILD")
}

pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|entry| entry.join(binary))
        .find(|candidate| is_executable_file(candidate))
}

/// Locate a tool: an explicitly configured path first, then PATH, then the
/// given well-known locations.
pub fn locate_tool(name: &str, configured: Option<&Path>, fallbacks: &[&str]) -> Option<PathBuf> {
    if let Some(path) = configured {
        return is_executable_file(path).then(|| path.to_path_buf());
    }
    find_in_path(name).or_else(|| {
        fallbacks
            .iter()
            .map(PathBuf::from)
            .find(|p| is_executable_file(p))
    })
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn configured_tool_must_be_executable() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("appimagetool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();

        assert_eq!(locate_tool("appimagetool", Some(&tool), &[]), None);

        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(locate_tool("appimagetool", Some(&tool), &[]), Some(tool));
    }

    #[test]
    fn configured_tool_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(locate_tool("sh", Some(&missing), &["/bin/sh"]), None);
    }
}
