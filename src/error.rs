//! Error taxonomy for a launcher run
//!
//! Every stage returns `Result<_, LauncherError>`. The orchestrator decides
//! which failures are soft (skip the update, still launch) and which halt the
//! run before launch.

use std::io;
use std::path::PathBuf;

/// Custom error type for launcher operations
#[derive(Debug)]
pub enum LauncherError {
    /// Settings file missing, unreadable, or not valid JSON
    Config { path: PathBuf, reason: String },
    /// Request never produced a response (DNS, TLS, connection reset, ...)
    Network { url: String, reason: String },
    /// Server answered with a non-success status
    HttpStatus { url: String, status: u16 },
    /// Feed body was not the expected JSON shape
    Parse { context: String, reason: String },
    /// Downloaded file is not a readable zip archive
    Archive { reason: String },
    /// Archive entry would land outside the install directory
    UnsafeEntry { name: String },
    /// Filesystem failure during download, cleanup, extraction or save
    Io { context: String, source: io::Error },
    /// Target executable could not be started
    Launch { path: PathBuf, source: io::Error },
}

impl LauncherError {
    /// Soft errors skip the update check but never block the launch.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            LauncherError::Network { .. } | LauncherError::HttpStatus { .. }
        )
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        LauncherError::Io {
            context: context.into(),
            source,
        }
    }
}

impl std::fmt::Display for LauncherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LauncherError::Config { path, reason } => {
                write!(f, "Failed to load settings '{}': {}", path.display(), reason)
            }
            LauncherError::Network { url, reason } => {
                write!(f, "Request to {} failed: {}", url, reason)
            }
            LauncherError::HttpStatus { url, status } => {
                write!(f, "Request to {} returned HTTP {}", url, status)
            }
            LauncherError::Parse { context, reason } => {
                write!(f, "Failed to parse {}: {}", context, reason)
            }
            LauncherError::Archive { reason } => write!(f, "Invalid update archive: {}", reason),
            LauncherError::UnsafeEntry { name } => {
                write!(f, "Archive entry '{}' escapes the install directory", name)
            }
            LauncherError::Io { context, source } => write!(f, "{}: {}", context, source),
            LauncherError::Launch { path, source } => {
                write!(f, "Failed to start '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for LauncherError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LauncherError::Io { source, .. } | LauncherError::Launch { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for LauncherError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(source) => LauncherError::io("Reading update archive", source),
            other => LauncherError::Archive {
                reason: other.to_string(),
            },
        }
    }
}
