//! Shared HTTP plumbing
//!
//! One `reqwest::Client` is built per process and shared by the mirror and
//! build-service clients.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::{log_debug, log_error};

const MODULE: &str = "http";

/// Build the HTTP client with the application user agent and request timeout
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .user_agent(config::app::USER_AGENT)
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| Error::Transport {
            url: String::new(),
            source: e,
        })
}

/// GET `url` and decode the JSON body; non-2xx statuses are errors
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    log_debug!(MODULE, "GET {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        log_error!(MODULE, "Request to {} failed: {}", url, e);
        Error::Transport {
            url: url.to_string(),
            source: e,
        }
    })?;

    if !response.status().is_success() {
        log_error!(MODULE, "{} returned status {}", url, response.status());
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    read_json(response, url).await
}

/// Read the whole body and decode it as JSON
pub async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    let body = response.bytes().await.map_err(|e| Error::Transport {
        url: url.to_string(),
        source: e,
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        log_error!(MODULE, "Failed to parse JSON from {}: {}", url, e);
        Error::Parse {
            url: url.to_string(),
            source: e,
        }
    })
}
