//! Shared utility functions used across the launcher

use rand::Rng;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::LauncherError;
use crate::github::http_error;

/// Download a file from URL to the specified path
pub fn download_file(agent: &ureq::Agent, url: &str, path: &Path) -> Result<(), LauncherError> {
    let resp = agent.get(url).call().map_err(|e| http_error(url, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| LauncherError::io(format!("Creating {}", parent.display()), e))?;
    }

    let mut reader = resp.into_reader();
    let mut file = fs::File::create(path)
        .map_err(|e| LauncherError::io(format!("Creating {}", path.display()), e))?;
    stream_to(&mut reader, &mut file, url, path)?;
    file.flush()
        .map_err(|e| LauncherError::io(format!("Writing {}", path.display()), e))?;
    Ok(())
}

/// Copy a response body into `out`. Read failures are network errors (soft),
/// write failures are local I/O errors (fatal).
fn stream_to<R: Read, W: Write>(
    reader: &mut R,
    out: &mut W,
    url: &str,
    path: &Path,
) -> Result<u64, LauncherError> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(LauncherError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        out.write_all(&buf[..n])
            .map_err(|e| LauncherError::io(format!("Writing {}", path.display()), e))?;
        total += n as u64;
    }
}

/// Collision-free path for a downloaded archive in the system temp dir.
pub fn unique_temp_path(extension: &str) -> PathBuf {
    let mut rng = rand::rng();
    let id: u128 = rng.random();
    std::env::temp_dir().join(format!("shipthat-{:032x}.{}", id, extension))
}

/// Removes the wrapped file when dropped.
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
