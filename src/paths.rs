use std::{path::PathBuf, sync::LazyLock};

use crate::error::LauncherError;

/// Default settings filename, looked up beside the launcher executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Fallback for the launcher's own filename when the running executable
/// cannot be inspected.
pub const DEFAULT_LAUNCHER_NAME: &str = if cfg!(windows) {
    "launcher.exe"
} else {
    "launcher"
};

pub static DEFAULT_DATA_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    if let Some(custom) = std::env::var_os("SHIPTHAT_DATA_PATH") {
        return PathBuf::from(custom);
    }

    let mut path = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir);
    path.push("ShipThatLauncher");
    path
});

/// Computes a path inside the launcher's data directory (logs live here,
/// never inside the install directory).
///
/// Returns a `&Path` referencing the data directory itself if no arguments are passed in, or a
/// `PathBuf` created by joining all of the arguments to the data directory if at least
/// one argument is passed in.
#[macro_export]
macro_rules! data_path {
    () => {
        $crate::paths::DEFAULT_DATA_PATH.as_path()
    };

    ( $( $path:expr ),+ $(,)? ) => {
        [
            $crate::paths::DEFAULT_DATA_PATH.as_path(),
            $( std::path::Path::new(&$path) ),+
        ].into_iter().collect::<std::path::PathBuf>()
    };
}

/// Directory holding the running launcher executable.
pub fn launcher_dir() -> Result<PathBuf, LauncherError> {
    let exe = std::env::current_exe()
        .map_err(|e| LauncherError::io("Locating launcher executable", e))?;
    exe.parent().map(|p| p.to_path_buf()).ok_or_else(|| {
        LauncherError::io(
            "Locating launcher directory",
            std::io::Error::new(std::io::ErrorKind::NotFound, "executable has no parent"),
        )
    })
}

/// Filename of the running launcher, protected from cleanup and extraction.
pub fn launcher_file_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| DEFAULT_LAUNCHER_NAME.to_string())
}
