//! Device selection state
//!
//! Ties the fetches to the user's choices: changing the version re-fetches
//! the profile overview, changing the device re-fetches its profile. A
//! choice that replaces one still loading supersedes it.

use crate::asu::{AsuClient, TargetDeviceProfile};
use crate::error::{Error, Result};
use crate::fetcher::DerivedFetch;
use crate::mirror::{find_profile, MirrorClient, Overview, ProfileSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceKey {
    pub version: String,
    pub target: String,
    pub profile: String,
}

pub struct Selection {
    mirror: MirrorClient,
    asu: AsuClient,
    overview: DerivedFetch<String>,
    device: DerivedFetch<DeviceKey>,
}

impl Selection {
    pub fn new(mirror: MirrorClient, asu: AsuClient) -> Self {
        Self {
            mirror,
            asu,
            overview: DerivedFetch::new(),
            device: DerivedFetch::new(),
        }
    }

    pub fn mirror(&self) -> &MirrorClient {
        &self.mirror
    }

    pub fn asu(&self) -> &AsuClient {
        &self.asu
    }

    /// Select a version; `Ok(None)` when it is already the selected one
    pub async fn select_version(&self, version: &str) -> Result<Option<Overview>> {
        let mirror = self.mirror.clone();
        self.overview
            .update(version.to_string(), move |version| async move {
                mirror.fetch_overview(&version).await
            })
            .await
    }

    /// Select a device; `Ok(None)` when it is already the selected one
    pub async fn select_device(&self, key: DeviceKey) -> Result<Option<TargetDeviceProfile>> {
        let asu = self.asu.clone();
        self.device
            .update(key, move |key| async move {
                asu.fetch_device_profile(&key.version, &key.target, &key.profile)
                    .await
            })
            .await
    }

    /// Fetch the overview of `version` and resolve `profile_id` in it
    pub async fn resolve_profile(
        &self,
        version: &str,
        profile_id: &str,
    ) -> Result<(ProfileSummary, TargetDeviceProfile)> {
        self.overview.invalidate().await;
        self.device.invalidate().await;

        let overview = self
            .select_version(version)
            .await?
            .ok_or(Error::Superseded)?;
        let summary = find_profile(&overview, profile_id)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound {
                version: version.to_string(),
                profile: profile_id.to_string(),
            })?;

        let device = self
            .select_device(DeviceKey {
                version: version.to_string(),
                target: summary.target.clone(),
                profile: summary.id.clone(),
            })
            .await?
            .ok_or(Error::Superseded)?;

        Ok((summary, device))
    }
}
