//! Application configuration
//!
//! Compile-time constants plus the environment-provided settings. Every
//! environment variable is optional and falls back to the OpenWrt defaults.

use std::time::Duration;

use crate::packages::split_tokens;

/// Application identity
pub mod app {
    pub const NAME: &str = env!("CARGO_PKG_NAME");
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    /// `NAME/VERSION`
    pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    /// Identifier sent to the build service with every build request
    pub fn client_id() -> String {
        USER_AGENT.to_string()
    }
}

/// Fallback values used when the environment does not provide one
pub mod defaults {
    pub const BRAND_NAME: &str = "OpenWrt";
    pub const HOME_URL: &str = "https://openwrt.org";
    pub const DOWNLOAD_URL: &str = "https://downloads.openwrt.org";
    pub const ASU_URL: &str = "https://sysupgrade.openwrt.org";
    pub const GITHUB_REPO: &str = "CzBiX/openwrt-firmware-selector";
    pub const RECENT_MAJOR_VERSION: u32 = 23;
    pub const RECOMMENDED_PACKAGES: &str = "luci";
    pub const POLL_INTERVAL_SECS: u64 = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Environment variable names
pub mod env {
    pub const BRAND_NAME: &str = "FWSEL_BRAND_NAME";
    pub const HOME_URL: &str = "FWSEL_HOME_URL";
    pub const DOWNLOAD_URL: &str = "FWSEL_DOWNLOAD_URL";
    pub const ASU_URL: &str = "FWSEL_ASU_URL";
    pub const GITHUB_REPO: &str = "FWSEL_GITHUB_REPO";
    pub const RECENT_MAJOR_VERSION: &str = "FWSEL_RECENT_MAJOR_VERSION";
    pub const RECOMMENDED_PACKAGES: &str = "FWSEL_RECOMMENDED_PACKAGES";
    pub const POLL_INTERVAL_SECS: &str = "FWSEL_POLL_INTERVAL_SECS";
    pub const POLL_TIMEOUT_SECS: &str = "FWSEL_POLL_TIMEOUT_SECS";
    pub const REQUEST_TIMEOUT_SECS: &str = "FWSEL_REQUEST_TIMEOUT_SECS";
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub brand_name: String,
    pub home_url: String,
    pub download_url: String,
    pub asu_url: String,
    pub github_repo: String,
    /// Versions with a lower major number are hidden unless asked for
    pub recent_major_version: u32,
    /// Packages added to every new package selection
    pub recommended_packages: Vec<String>,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str| get(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            brand_name: get(env::BRAND_NAME).unwrap_or_else(|| defaults::BRAND_NAME.to_string()),
            home_url: trim_url(get(env::HOME_URL).as_deref().unwrap_or(defaults::HOME_URL)),
            download_url: trim_url(
                get(env::DOWNLOAD_URL)
                    .as_deref()
                    .unwrap_or(defaults::DOWNLOAD_URL),
            ),
            asu_url: trim_url(get(env::ASU_URL).as_deref().unwrap_or(defaults::ASU_URL)),
            github_repo: get(env::GITHUB_REPO)
                .unwrap_or_else(|| defaults::GITHUB_REPO.to_string()),
            recent_major_version: get(env::RECENT_MAJOR_VERSION)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults::RECENT_MAJOR_VERSION),
            recommended_packages: parse_packages(
                get(env::RECOMMENDED_PACKAGES)
                    .as_deref()
                    .unwrap_or(defaults::RECOMMENDED_PACKAGES),
            ),
            poll_interval: Duration::from_secs(
                secs(env::POLL_INTERVAL_SECS)
                    .filter(|s| *s > 0)
                    .unwrap_or(defaults::POLL_INTERVAL_SECS),
            ),
            poll_timeout: secs(env::POLL_TIMEOUT_SECS)
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            request_timeout: Duration::from_secs(
                secs(env::REQUEST_TIMEOUT_SECS)
                    .filter(|s| *s > 0)
                    .unwrap_or(defaults::REQUEST_TIMEOUT_SECS),
            ),
        }
    }

    pub fn github_url(&self) -> String {
        format!("https://github.com/{}", self.github_repo)
    }
}

/// Parse a comma/space separated package list
pub fn parse_packages(value: &str) -> Vec<String> {
    split_tokens(value)
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
