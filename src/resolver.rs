//! Release selection
//!
//! Walks the feed in the order it was returned, without re-sorting. A newer
//! release that carries no matching asset does not end the scan; later
//! releases are still considered.

use chrono::{DateTime, Utc};

use crate::github::{GithubAsset, GithubRelease};

/// A release newer than the watermark together with the asset to install.
#[derive(Debug, Clone, Copy)]
pub struct UpdateMatch<'a> {
    pub release: &'a GithubRelease,
    pub asset: &'a GithubAsset,
    pub published_at: DateTime<Utc>,
}

/// Find the first non-draft release strictly newer than `watermark` that has
/// an asset whose download URL ends with `zip_suffix`.
pub fn find_update<'a>(
    releases: &'a [GithubRelease],
    watermark: DateTime<Utc>,
    zip_suffix: &str,
) -> Option<UpdateMatch<'a>> {
    for release in releases.iter().filter(|r| !r.draft) {
        let Some(published_at) = release.published_at else {
            continue;
        };
        if published_at <= watermark {
            continue;
        }

        if let Some(asset) = release
            .assets
            .iter()
            .find(|a| a.browser_download_url.ends_with(zip_suffix))
        {
            return Some(UpdateMatch {
                release,
                asset,
                published_at,
            });
        }
    }
    None
}
