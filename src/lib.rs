//! ShipThat Launcher
//!
//! Self-updating application launcher: checks a GitHub release feed, installs
//! a newer zip build in place, then starts the configured executable.
//! Library crate shared by the `launcher` binary and the tests.

#[macro_use]
pub mod paths;

pub mod app;
pub mod config;
pub mod error;
pub mod github;
pub mod installer;
pub mod launch;
pub mod logging;
pub mod resolver;
pub mod utils;

pub use error::LauncherError;
