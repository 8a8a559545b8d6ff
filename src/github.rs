//! GitHub release feed: wire types and the HTTP client that fetches them

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::error::LauncherError;
use crate::utils::download_file;

pub const DEFAULT_API_BASE: &str = "https://api.github.com/repos";
pub const USER_AGENT: &str = "ShipThatLauncher";

/// GitHub release metadata
#[derive(Deserialize, Debug, Clone)]
pub struct GithubRelease {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Unset for drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GithubAsset>,
}

impl GithubRelease {
    /// Name used in log lines: display name, then tag, then a placeholder.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.tag_name.as_deref())
            .unwrap_or("<unnamed release>")
    }
}

/// GitHub release asset
#[derive(Deserialize, Debug, Clone)]
pub struct GithubAsset {
    #[serde(default)]
    pub name: Option<String>,
    pub browser_download_url: String,
}

/// Parse a release feed body (a JSON array of releases).
pub fn parse_releases(body: &str) -> Result<Vec<GithubRelease>, LauncherError> {
    serde_json::from_str(body).map_err(|e| LauncherError::Parse {
        context: "release feed".to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Release Source
// ============================================================================

/// Where releases and their assets come from.
pub trait ReleaseSource {
    /// Every release of `owner/repo`, in the order the feed returns them.
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<GithubRelease>, LauncherError>;

    /// Stream an asset body into `dest`.
    fn download_asset(&self, url: &str, dest: &Path) -> Result<(), LauncherError>;
}

/// Blocking client for the GitHub REST API
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
}

impl GithubClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{}/{}/releases", self.api_base, owner, repo)
    }
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl ReleaseSource for GithubClient {
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<GithubRelease>, LauncherError> {
        let url = self.releases_url(owner, repo);
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| http_error(&url, e))?;

        let body = response.into_string().map_err(|e| LauncherError::Network {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        parse_releases(&body)
    }

    fn download_asset(&self, url: &str, dest: &Path) -> Result<(), LauncherError> {
        download_file(&self.agent, url, dest)
    }
}

/// Map a ureq failure onto the launcher taxonomy (both cases are soft).
pub(crate) fn http_error(url: &str, err: ureq::Error) -> LauncherError {
    match err {
        ureq::Error::Status(status, _) => LauncherError::HttpStatus {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => LauncherError::Network {
            url: url.to_string(),
            reason: t.to_string(),
        },
    }
}
