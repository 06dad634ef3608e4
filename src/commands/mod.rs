//! Command handlers behind the CLI
//!
//! Each handler prints its result to stdout; errors propagate to `main`.

pub mod build;
pub mod catalog;

use std::sync::Arc;

use reqwest::Client;

use crate::asu::AsuClient;
use crate::config::Config;
use crate::download::DownloadState;
use crate::error::Result;
use crate::http::build_client;
use crate::mirror::MirrorClient;
use crate::selection::Selection;

/// Shared state of one CLI invocation
pub struct AppState {
    pub config: Config,
    pub http: Client,
    pub selection: Selection,
    pub download_state: Arc<DownloadState>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http = build_client(&config)?;
        let mirror = MirrorClient::new(http.clone(), config.download_url.clone());
        let asu = AsuClient::new(http.clone(), config.asu_url.clone());
        Ok(Self {
            config,
            http,
            selection: Selection::new(mirror, asu),
            download_state: Arc::new(DownloadState::new()),
        })
    }

    pub fn mirror(&self) -> &MirrorClient {
        self.selection.mirror()
    }

    pub fn asu(&self) -> &AsuClient {
        self.selection.asu()
    }
}
