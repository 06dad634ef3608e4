//! Build service client
//!
//! Submits build requests, queries their status by request hash and fetches
//! device profiles.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config;
use crate::error::{Error, Result};
use crate::http::get_json;
use crate::mirror::version_path;
use crate::{log_debug, log_error, log_info};

use super::models::{BuildRequest, BuildingInfo, TargetDeviceProfile};

const MODULE: &str = "asu";

/// Submission body: the request plus the fields the client always sends
#[derive(Serialize)]
struct SubmitBody<'a> {
    #[serde(flatten)]
    request: &'a BuildRequest,
    diff_packages: bool,
    client: String,
}

#[derive(Debug, Clone)]
pub struct AsuClient {
    http: Client,
    base_url: String,
}

impl AsuClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self) -> String {
        format!("{}/api/v1/build", self.base_url)
    }

    pub fn status_url(&self, hash: &str) -> String {
        format!("{}/api/v1/build/{}", self.base_url, hash)
    }

    pub fn device_profile_url(&self, version_path: &str, target: &str, profile: &str) -> String {
        format!(
            "{}/json/v1/{}/targets/{}/{}.json",
            self.base_url, version_path, target, profile
        )
    }

    /// Where the images of a finished build are stored
    pub fn image_base_url(&self, bin_dir: &str) -> String {
        format!("{}/store/{}/", self.base_url, bin_dir)
    }

    pub async fn fetch_device_profile(
        &self,
        version: &str,
        target: &str,
        profile: &str,
    ) -> Result<TargetDeviceProfile> {
        let url = self.device_profile_url(&version_path(version), target, profile);
        log_info!(MODULE, "Fetching device profile from {}", url);
        get_json(&self.http, &url).await
    }

    /// Submit a build request.
    ///
    /// A non-success status is an error carrying the status text; the
    /// returned status may already be terminal when the server had a cached
    /// result for the same request.
    pub async fn submit(&self, request: &BuildRequest) -> Result<BuildingInfo> {
        let url = self.build_url();
        let body = SubmitBody {
            request,
            diff_packages: true,
            client: config::app::client_id(),
        };

        log_info!(
            MODULE,
            "Requesting build of {} ({}) for {} with {} packages",
            request.profile,
            request.target,
            request.version,
            request.packages.len()
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log_error!(MODULE, "Build request failed: {}", e);
                Error::Transport {
                    url: url.clone(),
                    source: e,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail")?.as_str().map(str::to_string));
            let status_text = status.canonical_reason().unwrap_or("Unknown status");
            log_error!(
                MODULE,
                "Build request rejected with {}: {:?}",
                status,
                detail
            );
            return Err(Error::BuildRejected {
                status: status.as_u16(),
                status_text: status_text.to_string(),
                detail,
            });
        }

        let info: BuildingInfo = crate::http::read_json(response, &url).await?;
        log_info!(
            MODULE,
            "Build request accepted: {} ({})",
            info.request_hash().unwrap_or("-"),
            info.detail()
        );
        Ok(info)
    }

    /// Fetch the current status of a build.
    ///
    /// The body is interpreted whatever the HTTP status, because the service
    /// reports queued and failed builds with non-200 codes.
    pub async fn poll(&self, hash: &str) -> Result<BuildingInfo> {
        let url = self.status_url(hash);
        log_debug!(MODULE, "Polling {}", url);

        let response = self.http.get(&url).send().await.map_err(|e| {
            log_error!(MODULE, "Status request failed: {}", e);
            Error::Transport {
                url: url.clone(),
                source: e,
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| Error::Transport {
            url: url.clone(),
            source: e,
        })?;

        match serde_json::from_slice::<BuildingInfo>(&body) {
            Ok(info) => {
                log_debug!(MODULE, "Build {} is {}", hash, info.detail());
                Ok(info)
            }
            Err(_) if !status.is_success() => Err(Error::HttpStatus {
                url,
                status: status.as_u16(),
            }),
            Err(e) => Err(Error::Parse { url, source: e }),
        }
    }
}
