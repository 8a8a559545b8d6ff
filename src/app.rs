//! Run orchestration
//!
//! `LoadSettings -> ResolveRelease -> (NoMatch | Install) -> Launch`.
//! Settings are threaded through as a value and only written back after a
//! successful install.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::LauncherError;
use crate::github::ReleaseSource;
use crate::installer::{install, InstallTarget};
use crate::launch::{launch, resolve_executable};
use crate::logging::{log_check, log_info, log_warning};
use crate::resolver::find_update;

// ============================================================================
// Types
// ============================================================================

/// Per-run options resolved by the front end.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub install_dir: PathBuf,
    pub launcher_name: String,
    pub skip_update: bool,
}

/// What the update stage did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Update check disabled for this run
    Skipped,
    /// Feed or download unreachable; the run continues without updating
    Unavailable { reason: String },
    /// No release newer than the watermark carries a matching asset
    UpToDate,
    Installed {
        release: String,
        published_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub update: UpdateOutcome,
    pub executable: PathBuf,
}

// ============================================================================
// Stages
// ============================================================================

/// Resolve and install an update, returning the (possibly advanced) settings.
///
/// Soft failures before the install directory is touched become
/// `UpdateOutcome::Unavailable`; everything else propagates.
pub fn check_and_install(
    mut settings: Settings,
    opts: &RunOptions,
    source: &dyn ReleaseSource,
) -> Result<(Settings, UpdateOutcome), LauncherError> {
    if opts.skip_update {
        log_info("Update check skipped");
        return Ok((settings, UpdateOutcome::Skipped));
    }

    log_check(&format!(
        "Checking for updates: {}/{}",
        settings.github_owner, settings.github_repo
    ));
    let releases = match source.list_releases(&settings.github_owner, &settings.github_repo) {
        Ok(releases) => releases,
        Err(e) if e.is_soft() => {
            log_warning(&format!("Update check unavailable: {}", e));
            return Ok((settings, UpdateOutcome::Unavailable { reason: e.to_string() }));
        }
        Err(e) => return Err(e),
    };
    log_check(&format!("{} release(s) found", releases.len()));

    let Some(update) = find_update(
        &releases,
        settings.latest_downloaded_update_date,
        &settings.zip_name,
    ) else {
        log_check("No newer release with a matching asset");
        return Ok((settings, UpdateOutcome::UpToDate));
    };
    log_check(&format!(
        "Found {} ({}) published {}",
        update.release.label(),
        update.asset.browser_download_url,
        update.published_at
    ));

    let target = InstallTarget {
        install_dir: opts.install_dir.clone(),
        keep: settings.retention_set(),
        launcher_name: opts.launcher_name.clone(),
    };
    let published_at = match install(source, &update, &target) {
        Ok(published_at) => published_at,
        Err(e) if e.is_soft() => {
            log_warning(&format!("Update download failed: {}", e));
            return Ok((settings, UpdateOutcome::Unavailable { reason: e.to_string() }));
        }
        Err(e) => return Err(e),
    };

    settings.record_update(published_at);
    Ok((
        settings,
        UpdateOutcome::Installed {
            release: update.release.label().to_string(),
            published_at,
        },
    ))
}

/// Full run with the given launch step.
pub fn run_with<F>(
    opts: &RunOptions,
    source: &dyn ReleaseSource,
    start: F,
) -> Result<RunReport, LauncherError>
where
    F: FnOnce(&Path) -> Result<(), LauncherError>,
{
    log_info(&format!("Loading settings from {}", opts.config_path.display()));
    let settings = Settings::load(&opts.config_path)?;

    let (settings, update) = check_and_install(settings, opts, source)?;
    if let UpdateOutcome::Installed { release, .. } = &update {
        settings.save(&opts.config_path)?;
        log_info(&format!(
            "Installed {}; watermark now {}",
            release, settings.latest_downloaded_update_date
        ));
    }

    let executable = resolve_executable(&opts.install_dir, &settings.exe_file_name);
    start(&executable)?;

    Ok(RunReport { update, executable })
}

/// Full run: update if possible, then start the target executable.
pub fn run(opts: &RunOptions, source: &dyn ReleaseSource) -> Result<RunReport, LauncherError> {
    run_with(opts, source, launch)
}
