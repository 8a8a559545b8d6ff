use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::LauncherError;

// ============================================================================
// Launcher Settings
// ============================================================================

/// Persistent launcher settings, stored as `config.json` beside the launcher.
///
/// Read once at startup and written back (full overwrite) only after an
/// update has been installed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub default_install_folder_name: String,
    pub exe_file_name: String,
    #[serde(default)]
    pub icon_file_name: String,
    #[serde(default)]
    pub use_launcher: bool,
    pub github_owner: String,
    pub github_repo: String,
    /// Suffix a release asset's download URL must end with
    pub zip_name: String,
    /// Publication time of the last installed release (the watermark).
    /// `DateTime::<Utc>::MIN_UTC` when nothing has been installed yet.
    #[serde(
        default = "min_instant",
        serialize_with = "serialize_watermark",
        deserialize_with = "deserialize_watermark"
    )]
    pub latest_downloaded_update_date: DateTime<Utc>,
    /// Filenames joined by `;` that survive pre-install cleanup
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub do_not_delete_these_files: String,
}

impl Settings {
    /// Load settings from disk. There are no defaults for a missing file.
    pub fn load(path: &Path) -> Result<Self, LauncherError> {
        let content = fs::read_to_string(path).map_err(|e| LauncherError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| LauncherError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), LauncherError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| LauncherError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json)
            .map_err(|e| LauncherError::io(format!("Writing settings to {}", path.display()), e))
    }

    /// Filenames protected from cleanup. Empty entries are dropped.
    pub fn retention_set(&self) -> HashSet<String> {
        self.do_not_delete_these_files
            .split(';')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Advance the watermark. Never moves it backwards.
    pub fn record_update(&mut self, published_at: DateTime<Utc>) {
        if published_at > self.latest_downloaded_update_date {
            self.latest_downloaded_update_date = published_at;
        }
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

fn min_instant() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

fn serialize_watermark<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    if *value == DateTime::<Utc>::MIN_UTC {
        s.serialize_none()
    } else {
        s.serialize_some(&value.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true))
    }
}

fn deserialize_watermark<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(DateTime::<Utc>::MIN_UTC),
        Some(raw) => parse_timestamp(&raw).map_err(serde::de::Error::custom),
    }
}

fn deserialize_nullable_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}
