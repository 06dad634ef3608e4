//! Error types
//!
//! Every failure surfaces to the caller; nothing here is retried.

use thiserror::Error;

/// Errors produced while talking to the download mirror or the build service
#[derive(Debug, Error)]
pub enum Error {
    /// DNS, connection, TLS or timeout failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status on a plain GET
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Non-success status on build submission
    #[error("Build request failed: {status_text}{}", .detail.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    BuildRejected {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },

    #[error("Failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A newer request replaced this one before it resolved
    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Timed out waiting for build {0}")]
    PollTimeout(String),

    #[error("SHA256 mismatch for {name}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Image name that is not a plain file name
    #[error("Invalid image name: {0:?}")]
    InvalidImageName(String),

    #[error("Download cancelled")]
    Cancelled,

    #[error("Profile {profile} not found for version {version}")]
    ProfileNotFound { version: String, profile: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejected_message() {
        let err = Error::BuildRejected {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "Build request failed: Internal Server Error");

        let err = Error::BuildRejected {
            status: 400,
            status_text: "Bad Request".to_string(),
            detail: Some("Unsupported profile".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Build request failed: Bad Request (Unsupported profile)"
        );
    }
}
