//! Filesystem helpers shared by the materializer and the assembler

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove whatever occupies `path` without following symlinks.
///
/// Files and symlinks are unlinked, directories removed recursively. A
/// missing path is not an error.
pub fn remove_existing(path: &Path) -> io::Result<()> {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Deep-copy the contents of `from` into `to` (created if needed).
///
/// Symbolic links inside `from` are skipped, as is `skip` when it lies
/// inside `from`. Returns the number of files copied.
pub fn copy_dir_all(from: &Path, to: &Path, skip: Option<&Path>) -> io::Result<u64> {
    fs::create_dir_all(to)?;
    let mut copied = 0;

    let walker = WalkDir::new(from)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| skip.map_or(true, |s| e.path() != s));

    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
        // Symlinks (and anything else) are left behind
    }

    Ok(copied)
}
