//! Download mirror client
//!
//! Fetches the version list and per-version profile overviews from the
//! static download mirror. No caching and no retry happen here.

mod filters;
mod models;

pub use filters::{find_profile, recent_versions, search_profiles, ProfileChoice};
pub use models::{Overview, ProfileSummary, ProfileTitle, VersionsResponse};

use reqwest::Client;

use crate::error::Result;
use crate::http::get_json;
use crate::log_info;

const MODULE: &str = "mirror";

/// Path segment of a version on both the mirror and the build service
pub fn version_path(version: &str) -> String {
    if version == "snapshot" {
        "snapshots".to_string()
    } else {
        format!("releases/{}", version)
    }
}

/// Client for the static download mirror
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: Client,
    base_url: String,
}

impl MirrorClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn versions_url(&self) -> String {
        format!("{}/.versions.json", self.base_url)
    }

    pub fn overview_url(&self, version: &str) -> String {
        format!("{}/{}/.overview.json", self.base_url, version_path(version))
    }

    /// Directory holding the prebuilt images of a target
    pub fn target_url(&self, version: &str, target: &str) -> String {
        format!(
            "{}/{}/targets/{}",
            self.base_url,
            version_path(version),
            target
        )
    }

    pub async fn fetch_versions(&self) -> Result<VersionsResponse> {
        let url = self.versions_url();
        log_info!(MODULE, "Fetching versions from {}", url);
        let versions: VersionsResponse = get_json(&self.http, &url).await?;
        log_info!(
            MODULE,
            "Found {} versions (stable: {})",
            versions.versions_list.len(),
            versions.stable_version
        );
        Ok(versions)
    }

    pub async fn fetch_overview(&self, version: &str) -> Result<Overview> {
        let url = self.overview_url(version);
        log_info!(MODULE, "Fetching profiles for {} from {}", version, url);
        let overview: Overview = get_json(&self.http, &url).await?;
        log_info!(MODULE, "Loaded {} profiles", overview.profiles.len());
        Ok(overview)
    }
}
