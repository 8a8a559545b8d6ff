//! Starting the target application

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::LauncherError;
use crate::logging::log_launch;

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// Resolve the configured executable: relative names live in the install dir.
pub fn resolve_executable(install_dir: &Path, exe_file_name: &str) -> PathBuf {
    let exe = Path::new(exe_file_name);
    if exe.is_absolute() {
        exe.to_path_buf()
    } else {
        install_dir.join(exe)
    }
}

/// Build the command for `exe`: no shell, no arguments, inherited environment.
pub fn command_for(exe: &Path) -> Command {
    let mut cmd = Command::new(exe);

    // Own process group so the child outlives the launcher
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }

    cmd
}

/// Start `exe` detached and return without waiting for it.
pub fn launch(exe: &Path) -> Result<(), LauncherError> {
    log_launch(&format!("Executing: {}", exe.display()));

    let child = command_for(exe).spawn().map_err(|e| LauncherError::Launch {
        path: exe.to_path_buf(),
        source: e,
    })?;

    log_launch(&format!("Started process {}", child.id()));
    Ok(())
}
