//! In-place installer
//!
//! Replaces the contents of the install directory with a release archive:
//! download to a temp file, validate the archive, delete everything that is
//! not protected, extract, then remove the temp file.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::LauncherError;
use crate::github::ReleaseSource;
use crate::logging::{log_download, log_install};
use crate::resolver::UpdateMatch;
use crate::utils::{unique_temp_path, TempFile};

/// Where an update lands and which files must survive it.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    pub install_dir: PathBuf,
    /// Filenames (not paths) never deleted during cleanup
    pub keep: HashSet<String>,
    /// The launcher's own filename: never deleted, never extracted
    pub launcher_name: String,
}

impl InstallTarget {
    fn is_protected(&self, file_name: &str) -> bool {
        file_name == self.launcher_name || self.keep.contains(file_name)
    }
}

/// Download `update` and install it over `target.install_dir`.
///
/// Returns the release's publication time, the new watermark to persist.
pub fn install(
    source: &dyn ReleaseSource,
    update: &UpdateMatch<'_>,
    target: &InstallTarget,
) -> Result<DateTime<Utc>, LauncherError> {
    let url = &update.asset.browser_download_url;
    let temp = TempFile::new(unique_temp_path("zip"));

    log_download(&format!("Downloading {} to {}", url, temp.path().display()));
    source.download_asset(url, temp.path())?;

    let install_dir = fs::canonicalize(&target.install_dir).map_err(|e| {
        LauncherError::io(format!("Resolving {}", target.install_dir.display()), e)
    })?;

    // Open and vet the archive before anything in the install dir is touched
    let file = File::open(temp.path())
        .map_err(|e| LauncherError::io(format!("Opening {}", temp.path().display()), e))?;
    let mut archive = ZipArchive::new(io::BufReader::new(file))?;
    validate_archive(&mut archive)?;

    log_install("Cleaning up old install...");
    let removed = clean_install_dir(&install_dir, target)?;
    log_install(&format!("Removed {} file(s)", removed));

    let written = extract_archive(&mut archive, &install_dir, &target.launcher_name)?;
    log_install(&format!(
        "Extracted {} file(s) from {}",
        written,
        update.release.label()
    ));

    drop(archive);
    fs::remove_file(temp.path())
        .map_err(|e| LauncherError::io(format!("Removing {}", temp.path().display()), e))?;

    Ok(update.published_at)
}

/// Delete every file under `install_dir` whose filename is not protected.
/// Directories are left in place. Any failed deletion aborts the install.
pub fn clean_install_dir(install_dir: &Path, target: &InstallTarget) -> Result<usize, LauncherError> {
    let mut doomed = Vec::new();
    for entry in WalkDir::new(install_dir).min_depth(1) {
        let entry = entry.map_err(|e| {
            LauncherError::io(format!("Scanning {}", install_dir.display()), e.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if target.is_protected(&name) {
            continue;
        }
        doomed.push(entry.into_path());
    }

    for path in &doomed {
        log_install(&format!("Deleting {}", path.display()));
        fs::remove_file(path)
            .map_err(|e| LauncherError::io(format!("Deleting {}", path.display()), e))?;
    }
    Ok(doomed.len())
}

/// Reject archives with entries that would resolve outside the install dir.
pub fn validate_archive<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<(), LauncherError> {
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        entry_relative_path(entry.name(), entry.enclosed_name())?;
    }
    Ok(())
}

/// Extract every entry over `install_dir`, overwriting existing files.
/// Entries named `launcher_name` are skipped. Returns the number of files written.
pub fn extract_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    install_dir: &Path,
    launcher_name: &str,
) -> Result<usize, LauncherError> {
    let install_dir = fs::canonicalize(install_dir)
        .map_err(|e| LauncherError::io(format!("Resolving {}", install_dir.display()), e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry_relative_path(entry.name(), entry.enclosed_name())?;
        let dest = install_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| LauncherError::io(format!("Creating {}", dest.display()), e))?;
            ensure_inside(&install_dir, &dest, entry.name())?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| LauncherError::io(format!("Creating {}", parent.display()), e))?;
            ensure_inside(&install_dir, parent, entry.name())?;
        }
        // An existing file at the destination may itself be a link
        if fs::symlink_metadata(&dest).is_ok_and(|m| m.file_type().is_symlink()) {
            ensure_inside(&install_dir, &dest, entry.name())?;
        }

        let is_launcher = relative
            .file_name()
            .is_some_and(|n| n.to_string_lossy() == launcher_name);
        if is_launcher {
            log_install(&format!("Skipping {} (launcher)", entry.name()));
            continue;
        }

        log_install(&format!("Extracting {}", entry.name()));
        let mut out = File::create(&dest)
            .map_err(|e| LauncherError::io(format!("Creating {}", dest.display()), e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| LauncherError::io(format!("Extracting {}", entry.name()), e))?;
        drop(out);

        apply_mode(&dest, entry.unix_mode())?;

        written += 1;
    }
    Ok(written)
}

/// Fail with `UnsafeEntry` unless `path`, with symlinks resolved, is inside `root`.
/// `root` must already be canonical.
fn ensure_inside(root: &Path, path: &Path, entry_name: &str) -> Result<(), LauncherError> {
    let inside = fs::canonicalize(path).is_ok_and(|resolved| resolved.starts_with(root));
    if inside {
        Ok(())
    } else {
        Err(LauncherError::UnsafeEntry {
            name: entry_name.to_string(),
        })
    }
}

#[cfg(unix)]
fn apply_mode(dest: &Path, mode: Option<u32>) -> Result<(), LauncherError> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode else {
        return Ok(());
    };
    fs::set_permissions(dest, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| LauncherError::io(format!("Setting permissions on {}", dest.display()), e))
}

#[cfg(not(unix))]
fn apply_mode(_dest: &Path, _mode: Option<u32>) -> Result<(), LauncherError> {
    Ok(())
}

/// Relative path of an archive entry, or `UnsafeEntry` if it is absolute or
/// climbs out with `..`.
fn entry_relative_path(name: &str, enclosed: Option<PathBuf>) -> Result<PathBuf, LauncherError> {
    let unsafe_entry = || LauncherError::UnsafeEntry {
        name: name.to_string(),
    };
    let path = enclosed.ok_or_else(unsafe_entry)?;
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(unsafe_entry());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{GithubAsset, GithubRelease};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            let options = SimpleFileOptions::default();
            match body {
                Some(bytes) => {
                    writer.start_file(*name, options).unwrap();
                    writer.write_all(bytes.as_bytes()).unwrap();
                }
                None => writer.add_directory(*name, options).unwrap(),
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn target(dir: &Path, keep: &[&str]) -> InstallTarget {
        InstallTarget {
            install_dir: dir.to_path_buf(),
            keep: keep.iter().map(|s| s.to_string()).collect(),
            launcher_name: "launcher.exe".to_string(),
        }
    }

    struct ZipSource {
        archive: Vec<u8>,
        downloaded: RefCell<Vec<PathBuf>>,
    }

    impl ReleaseSource for ZipSource {
        fn list_releases(&self, _: &str, _: &str) -> Result<Vec<GithubRelease>, LauncherError> {
            Ok(Vec::new())
        }

        fn download_asset(&self, _url: &str, dest: &Path) -> Result<(), LauncherError> {
            fs::write(dest, &self.archive).unwrap();
            self.downloaded.borrow_mut().push(dest.to_path_buf());
            Ok(())
        }
    }

    fn sample_release() -> GithubRelease {
        GithubRelease {
            name: Some("v2.0".to_string()),
            tag_name: Some("v2.0".to_string()),
            draft: false,
            prerelease: false,
            created_at: None,
            published_at: Some(Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()),
            assets: vec![GithubAsset {
                name: Some("app.zip".to_string()),
                browser_download_url: "https://x/v2.0/app.zip".to_string(),
            }],
        }
    }

    #[test]
    fn test_cleanup_respects_retention() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("settings.json"), "{}").unwrap();
        fs::write(dir.path().join("old.json"), "{}").unwrap();
        fs::write(dir.path().join("data/settings.json"), "{}").unwrap();
        fs::write(dir.path().join("data/cache.json"), "{}").unwrap();
        fs::write(dir.path().join("launcher.exe"), "MZ").unwrap();

        let removed = clean_install_dir(dir.path(), &target(dir.path(), &["settings.json"])).unwrap();
        assert_eq!(removed, 2);

        assert!(dir.path().join("settings.json").exists());
        assert!(dir.path().join("data/settings.json").exists());
        assert!(dir.path().join("launcher.exe").exists());
        assert!(!dir.path().join("old.json").exists());
        assert!(!dir.path().join("data/cache.json").exists());
        // Directories are not removed
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_extract_overwrites_and_skips_launcher() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.exe"), "old").unwrap();
        fs::write(dir.path().join("launcher.exe"), "running launcher").unwrap();

        let bytes = build_zip(&[
            ("app.exe", Some("new")),
            ("launcher.exe", Some("replacement launcher")),
            ("assets/", None),
            ("assets/img/logo.png", Some("png")),
        ]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let written = extract_archive(&mut archive, dir.path(), "launcher.exe").unwrap();

        assert_eq!(written, 2);
        assert_eq!(fs::read_to_string(dir.path().join("app.exe")).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(dir.path().join("launcher.exe")).unwrap(),
            "running launcher"
        );
        assert!(dir.path().join("assets").is_dir());
        assert_eq!(fs::read(dir.path().join("assets/img/logo.png")).unwrap(), b"png");
    }

    #[test]
    fn test_traversal_entry_rejected() {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("a/b");
        fs::create_dir_all(&install_dir).unwrap();

        let bytes = build_zip(&[("ok.txt", Some("fine")), ("../../evil", Some("pwned"))]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let err = validate_archive(&mut archive).unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeEntry { ref name } if name == "../../evil"));

        let err = extract_archive(&mut archive, &install_dir, "launcher.exe").unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeEntry { .. }));
        assert!(!root.path().join("evil").exists());
    }

    #[test]
    fn test_install_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.exe"), "v1").unwrap();
        fs::write(dir.path().join("stale.dll"), "gone").unwrap();
        fs::write(dir.path().join("user.cfg"), "mine").unwrap();
        fs::write(dir.path().join("launcher.exe"), "self").unwrap();

        let source = ZipSource {
            archive: build_zip(&[("app.exe", Some("v2")), ("readme.txt", Some("hi"))]),
            downloaded: RefCell::new(Vec::new()),
        };
        let release = sample_release();
        let update = UpdateMatch {
            release: &release,
            asset: &release.assets[0],
            published_at: release.published_at.unwrap(),
        };

        let watermark = install(&source, &update, &target(dir.path(), &["user.cfg"])).unwrap();
        assert_eq!(watermark, release.published_at.unwrap());

        assert_eq!(fs::read_to_string(dir.path().join("app.exe")).unwrap(), "v2");
        assert_eq!(fs::read_to_string(dir.path().join("user.cfg")).unwrap(), "mine");
        assert_eq!(fs::read_to_string(dir.path().join("launcher.exe")).unwrap(), "self");
        assert!(dir.path().join("readme.txt").exists());
        assert!(!dir.path().join("stale.dll").exists());

        // Temp archive removed
        let downloaded = source.downloaded.borrow();
        assert_eq!(downloaded.len(), 1);
        assert!(!downloaded[0].exists());
    }

    #[test]
    fn test_bad_archive_leaves_install_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.exe"), "v1").unwrap();

        let release = sample_release();
        let update = UpdateMatch {
            release: &release,
            asset: &release.assets[0],
            published_at: release.published_at.unwrap(),
        };

        let corrupt = ZipSource {
            archive: b"this is not a zip".to_vec(),
            downloaded: RefCell::new(Vec::new()),
        };
        let err = install(&corrupt, &update, &target(dir.path(), &[])).unwrap_err();
        assert!(matches!(err, LauncherError::Archive { .. } | LauncherError::Io { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("app.exe")).unwrap(), "v1");

        let hostile = ZipSource {
            archive: build_zip(&[("app.exe", Some("v2")), ("../../evil", Some("x"))]),
            downloaded: RefCell::new(Vec::new()),
        };
        let err = install(&hostile, &update, &target(dir.path(), &[])).unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeEntry { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("app.exe")).unwrap(), "v1");
        assert!(!hostile.downloaded.borrow()[0].exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_keeps_unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("bin/app", SimpleFileOptions::default().unix_permissions(0o755))
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        extract_archive(&mut archive, dir.path(), "launcher").unwrap();

        let mode = fs::metadata(dir.path().join("bin/app")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_kept_symlinked_dir_cannot_redirect_extraction() {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("install");
        let outside = root.path().join("outside");
        fs::create_dir_all(&install_dir).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink("../outside", install_dir.join("data")).unwrap();

        let target = target(&install_dir, &["data"]);
        clean_install_dir(&install_dir, &target).unwrap();
        assert!(install_dir.join("data").exists());

        let bytes = build_zip(&[("data/evil", Some("pwned"))]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        validate_archive(&mut archive).unwrap();

        let err = extract_archive(&mut archive, &install_dir, "launcher.exe").unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeEntry { ref name } if name == "data/evil"));
        assert!(!outside.join("evil").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_kept_symlinked_file_cannot_redirect_extraction() {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("install");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(root.path().join("secret.txt"), "original").unwrap();
        std::os::unix::fs::symlink("../secret.txt", install_dir.join("notes.txt")).unwrap();

        let bytes = build_zip(&[("notes.txt", Some("overwritten"))]);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let err = extract_archive(&mut archive, &install_dir, "launcher.exe").unwrap_err();
        assert!(matches!(err, LauncherError::UnsafeEntry { .. }));
        assert_eq!(fs::read_to_string(root.path().join("secret.txt")).unwrap(), "original");
    }
}
