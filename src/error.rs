//! Error types for configuration, link materialization and package assembly.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A configuration field is missing, malformed or inconsistent.
///
/// Always fatal and always raised before the package tree is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("game directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("game path is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error("application name is empty")]
    EmptyAppName,

    #[error("application name '{0}' cannot be used as a file name")]
    InvalidAppName(String),

    #[error("output file name '{0}' must not contain a directory")]
    InvalidOutputName(String),

    #[error(
        "build directory {} would delete the game directory {}",
        .assembly_root.display(),
        .source_dir.display()
    )]
    AssemblyRootContainsSource {
        assembly_root: PathBuf,
        source_dir: PathBuf,
    },

    #[error(
        "build directory {} would delete {}",
        .assembly_root.display(),
        .protected.display()
    )]
    AssemblyRootContainsProtected {
        assembly_root: PathBuf,
        protected: PathBuf,
    },

    #[error(
        "build directory {} contains {}, which no previous build created; refusing to wipe it",
        .assembly_root.display(),
        .entry.display()
    )]
    AssemblyRootInUse { assembly_root: PathBuf, entry: PathBuf },

    #[error("unsupported package type: {0} (expected nwjs or wine)")]
    UnknownRuntime(String),

    #[error("no Windows executable specified or found under {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("invalid path '{}' inside the game: {reason}", .path.display())]
    InvalidGamePath { path: PathBuf, reason: &'static str },

    #[error(
        "save file '{}' overlaps redirected save directory '{}'",
        .file.display(),
        .directory.display()
    )]
    OverlappingRedirects { directory: PathBuf, file: PathBuf },

    #[error("invalid save pattern '{pattern}': {reason}")]
    InvalidSavePattern { pattern: String, reason: &'static str },

    #[error("save range {start}..{end} has more than {max} slots")]
    SaveRangeTooLarge { start: i64, end: i64, max: u64 },
}

/// Failure of a single redirection. Never fatal to the build.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The symbolic link could not be created.
    #[error("failed to link {} -> {}: {source}", .point.display(), .target.display())]
    Redirection {
        point: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying persistent content into the package failed.
    #[error("failed to copy {} -> {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Preparing the persistent target or clearing the redirection point failed.
    #[error("failed to prepare {}: {source}", .path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal failure while assembling a package.
#[derive(Debug, Error)]
pub enum PackError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The game tree could not be copied; the package would be incomplete.
    #[error("failed to copy game files from {}: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PackError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PackError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
