use std::{path::PathBuf, sync::LazyLock};

pub static DEFAULT_TOOL_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    let mut path = home_dir();

    if std::env::var("AGAMEPACK_XDG_PATH").is_ok() {
        path.push(".config")
    }

    path.push("AGamePack");
    path
});

/// The user's home directory, or `/tmp` when it cannot be determined.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Computes a path under the agamepack tool directory.
///
/// Returns a `&Path` referencing the tool directory itself if no arguments are passed in, or a
/// `PathBuf` created by joining all of the arguments to the base directory if at least
/// one argument is passed in.
///
/// # Examples
///
/// ```
/// // Assuming `AGAMEPACK_XDG_PATH` is not set, the tool directory is ~/AGamePack
/// let logs = agamepack::agamepack_path!("logs");
/// assert!(logs.ends_with("AGamePack/logs"));
/// ```
#[macro_export]
macro_rules! agamepack_path {
    () => {
        $crate::paths::DEFAULT_TOOL_PATH.as_path()
    };

    ( $( $path:expr ),+ $(,)? ) => {
        [
            $crate::paths::DEFAULT_TOOL_PATH.as_path(),
            $( std::path::Path::new(&$path) ),+
        ].into_iter().collect::<std::path::PathBuf>()
    };
}
