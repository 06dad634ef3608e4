//! Build status polling
//!
//! The service never pushes updates, so the client re-queries the status by
//! request hash until a terminal state is reached. Stale responses that
//! would move the build backwards are dropped.

use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::{log_debug, log_info, log_warn};

use super::client::AsuClient;
use super::models::BuildingInfo;

const MODULE: &str = "poller";

/// Anything that can report the status of a build by hash
pub trait BuildStatusSource {
    fn fetch_status(&self, hash: &str) -> impl Future<Output = Result<BuildingInfo>>;
}

impl BuildStatusSource for AsuClient {
    fn fetch_status(&self, hash: &str) -> impl Future<Output = Result<BuildingInfo>> {
        self.poll(hash)
    }
}

/// Latest accepted status of one build
#[derive(Debug, Default)]
pub struct BuildTracker {
    current: Option<BuildingInfo>,
}

impl BuildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&BuildingInfo> {
        self.current.as_ref()
    }

    pub fn into_current(self) -> Option<BuildingInfo> {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current.as_ref().is_some_and(BuildingInfo::is_terminal)
    }

    /// Record a status; returns false when it was dropped as a regression
    /// or arrived after a terminal state.
    pub fn observe(&mut self, info: BuildingInfo) -> bool {
        if let Some(current) = &self.current {
            if current.is_terminal() {
                log_debug!(MODULE, "Ignoring {} after terminal state", info.detail());
                return false;
            }

            let (from, to) = (current.phase().rank(), info.phase().rank());
            if to < from {
                log_warn!(
                    MODULE,
                    "Ignoring stale status {} (already {})",
                    info.detail(),
                    current.detail()
                );
                return false;
            }

            if to == from {
                let sub = (
                    current.imagebuilder_status().and_then(|s| s.rank()),
                    info.imagebuilder_status().and_then(|s| s.rank()),
                );
                if let (Some(old), Some(new)) = sub {
                    if new < old {
                        log_warn!(MODULE, "Ignoring stale imagebuilder status");
                        return false;
                    }
                }
            }
        }

        self.current = Some(info);
        true
    }
}

/// Poll `hash` every `interval` until a terminal status or an error.
///
/// The first poll happens immediately. The stream ends after yielding a
/// terminal status or the first error; nothing is retried.
pub fn status_stream<'a, S>(
    source: &'a S,
    hash: &'a str,
    interval: Duration,
) -> impl Stream<Item = Result<BuildingInfo>> + 'a
where
    S: BuildStatusSource,
{
    stream::unfold((true, false), move |(first, finished)| async move {
        if finished {
            return None;
        }
        if !first {
            tokio::time::sleep(interval).await;
        }
        let result = source.fetch_status(hash).await;
        let stop = match &result {
            Ok(info) => info.is_terminal(),
            Err(_) => true,
        };
        Some((result, (false, stop)))
    })
}

/// Waits for builds to finish
#[derive(Debug, Clone)]
pub struct BuildPoller {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl BuildPoller {
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    /// Poll until the build reaches a terminal state.
    ///
    /// `initial` is the status already known (e.g. the submit response); when
    /// given, the first poll waits one interval. `on_update` sees every
    /// accepted status, including `initial`.
    pub async fn wait<S, F>(
        &self,
        source: &S,
        hash: &str,
        initial: Option<BuildingInfo>,
        mut on_update: F,
    ) -> Result<BuildingInfo>
    where
        S: BuildStatusSource,
        F: FnMut(&BuildingInfo),
    {
        let mut tracker = BuildTracker::new();
        let delay_first = initial.is_some();
        if let Some(info) = initial {
            if tracker.observe(info) {
                if let Some(current) = tracker.current() {
                    on_update(current);
                }
            }
        }

        let run = async {
            if tracker.is_terminal() {
                return Ok(());
            }
            if delay_first {
                tokio::time::sleep(self.interval).await;
            }

            let mut updates = std::pin::pin!(status_stream(source, hash, self.interval));
            while let Some(item) = updates.next().await {
                let info = item?;
                if tracker.observe(info) {
                    if let Some(current) = tracker.current() {
                        on_update(current);
                    }
                }
                if tracker.is_terminal() {
                    break;
                }
            }
            Ok::<(), Error>(())
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| Error::PollTimeout(hash.to_string()))??,
            None => run.await?,
        }

        let last = tracker
            .into_current()
            .ok_or_else(|| Error::Task(format!("no status received for build {}", hash)))?;
        log_info!(MODULE, "Build {} finished: {}", hash, last.detail());
        Ok(last)
    }
}
