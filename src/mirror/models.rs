//! Download mirror data models
//!
//! Types representing the static JSON index files on the download mirror.

use serde::{Deserialize, Serialize};

/// `/.versions.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionsResponse {
    pub stable_version: String,
    pub versions_list: Vec<String>,
}

/// One human-readable name of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTitle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl ProfileTitle {
    /// Explicit title if set, otherwise "vendor model variant"
    pub fn display(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }

        [
            self.vendor.as_str(),
            self.model.as_str(),
            self.variant.as_deref().unwrap_or(""),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Profile entry from a version's `.overview.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    #[serde(default)]
    pub titles: Vec<ProfileTitle>,
    pub target: String,
}

/// `/{releases/<version>|snapshots}/.overview.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub profiles: Vec<ProfileSummary>,
}
