//! Build service data models
//!
//! Request and status types exchanged with the image build service. The
//! status response is a tagged union keyed by `detail`; each variant carries
//! only the fields that exist in that state.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::log_warn;
use crate::mirror::ProfileTitle;

use super::images::ImageKind;

/// Body of a build submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub version: String,
    pub target: String,
    pub profile: String,
    pub packages: Vec<String>,
    /// uci-defaults script run on first boot
    #[serde(default)]
    pub defaults: String,
    pub rootfs_size_mb: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxKernel {
    pub release: String,
    pub vermagic: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub name: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(rename = "type")]
    pub image_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<String>,
}

impl ImageInfo {
    pub fn kind(&self) -> ImageKind {
        ImageKind::from_type(&self.image_type)
    }
}

/// Target metadata merged with device metadata, as served by
/// `/json/v1/.../targets/{target}/{profile}.json` and embedded in finished
/// build responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetDeviceProfile {
    pub id: String,
    pub target: String,
    pub arch_packages: String,
    pub linux_kernel: LinuxKernel,
    pub default_packages: Vec<String>,
    #[serde(deserialize_with = "number_or_string")]
    pub source_date_epoch: i64,
    pub version_code: String,
    pub version_number: String,
    pub device_packages: Vec<String>,
    pub image_prefix: String,
    pub images: Vec<ImageInfo>,
    pub supported_devices: Vec<String>,
    pub titles: Vec<ProfileTitle>,
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_i64().unwrap_or_default()),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        _ => Ok(0),
    }
}

/// Progress of the image builder inside a started build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageBuilderStatus {
    #[default]
    Init,
    ContainerSetup,
    ValidateRevision,
    ValidateManifest,
    BuildingImage,
    SigningImages,
    Done,
    Failed,
    #[serde(other)]
    Other,
}

impl ImageBuilderStatus {
    /// Position in the fixed progression; `None` for unrecognised states
    pub fn rank(self) -> Option<u8> {
        match self {
            ImageBuilderStatus::Init => Some(0),
            ImageBuilderStatus::ContainerSetup => Some(1),
            ImageBuilderStatus::ValidateRevision => Some(2),
            ImageBuilderStatus::ValidateManifest => Some(3),
            ImageBuilderStatus::BuildingImage => Some(4),
            ImageBuilderStatus::SigningImages => Some(5),
            ImageBuilderStatus::Done | ImageBuilderStatus::Failed => Some(6),
            ImageBuilderStatus::Other => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageBuilderStatus::Init => "init",
            ImageBuilderStatus::ContainerSetup => "container_setup",
            ImageBuilderStatus::ValidateRevision => "validate_revision",
            ImageBuilderStatus::ValidateManifest => "validate_manifest",
            ImageBuilderStatus::BuildingImage => "building_image",
            ImageBuilderStatus::SigningImages => "signing_images",
            ImageBuilderStatus::Done => "done",
            ImageBuilderStatus::Failed => "failed",
            ImageBuilderStatus::Other => "other",
        }
    }
}

/// Fields present in every status response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildBase {
    pub status: i64,
    pub enqueued_at: String,
    pub request_hash: String,
}

/// Fields present once the image builder has picked the request up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default)]
    pub imagebuilder_status: ImageBuilderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_cmd: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedBuild {
    #[serde(flatten)]
    pub base: BuildBase,
    #[serde(default)]
    pub queue_position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedBuild {
    #[serde(flatten)]
    pub base: BuildBase,
    #[serde(flatten)]
    pub run: RunInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoneBuild {
    #[serde(flatten)]
    pub base: BuildBase,
    #[serde(flatten)]
    pub run: RunInfo,
    #[serde(flatten)]
    pub profile: TargetDeviceProfile,
    /// Resolved package versions, in server order
    #[serde(default)]
    pub manifest: IndexMap<String, String>,
    pub bin_dir: String,
    #[serde(default)]
    pub build_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBuild {
    #[serde(flatten)]
    pub base: BuildBase,
    #[serde(default)]
    pub stderr: String,
}

/// Coarse lifecycle position of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Queued,
    Started,
    Done,
    Failed,
    Unsupported,
}

impl BuildPhase {
    /// queued < started < {done, failed, unsupported}
    pub fn rank(self) -> u8 {
        match self {
            BuildPhase::Queued => 0,
            BuildPhase::Started => 1,
            BuildPhase::Done | BuildPhase::Failed | BuildPhase::Unsupported => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

/// Build status as reported by the build service
#[derive(Debug, Clone, PartialEq)]
pub enum BuildingInfo {
    Queued(QueuedBuild),
    Started(StartedBuild),
    Done(Box<DoneBuild>),
    Failed(FailedBuild),
    /// `detail` missing or outside the known set; terminal
    Unsupported { detail: Option<String>, raw: Value },
}

impl BuildingInfo {
    /// Interpret a decoded status body by its `detail` field
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let detail = value
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string);

        let info = match detail.as_deref() {
            Some("queued") => BuildingInfo::Queued(serde_json::from_value(value)?),
            Some("started") => BuildingInfo::Started(serde_json::from_value(value)?),
            Some("done") => BuildingInfo::Done(Box::new(serde_json::from_value(value)?)),
            Some("failed") => BuildingInfo::Failed(serde_json::from_value(value)?),
            _ => {
                log_warn!("asu", "Unsupported build detail: {:?}", detail);
                BuildingInfo::Unsupported { detail, raw: value }
            }
        };
        Ok(info)
    }

    pub fn phase(&self) -> BuildPhase {
        match self {
            BuildingInfo::Queued(_) => BuildPhase::Queued,
            BuildingInfo::Started(_) => BuildPhase::Started,
            BuildingInfo::Done(_) => BuildPhase::Done,
            BuildingInfo::Failed(_) => BuildPhase::Failed,
            BuildingInfo::Unsupported { .. } => BuildPhase::Unsupported,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// The `detail` string this status was parsed from
    pub fn detail(&self) -> &str {
        match self {
            BuildingInfo::Queued(_) => "queued",
            BuildingInfo::Started(_) => "started",
            BuildingInfo::Done(_) => "done",
            BuildingInfo::Failed(_) => "failed",
            BuildingInfo::Unsupported { detail, .. } => detail.as_deref().unwrap_or(""),
        }
    }

    pub fn base(&self) -> Option<&BuildBase> {
        match self {
            BuildingInfo::Queued(b) => Some(&b.base),
            BuildingInfo::Started(b) => Some(&b.base),
            BuildingInfo::Done(b) => Some(&b.base),
            BuildingInfo::Failed(b) => Some(&b.base),
            BuildingInfo::Unsupported { .. } => None,
        }
    }

    pub fn request_hash(&self) -> Option<&str> {
        match self {
            BuildingInfo::Unsupported { raw, .. } => raw.get("request_hash")?.as_str(),
            other => other
                .base()
                .map(|b| b.request_hash.as_str())
                .filter(|h| !h.is_empty()),
        }
    }

    pub fn imagebuilder_status(&self) -> Option<ImageBuilderStatus> {
        match self {
            BuildingInfo::Started(b) => Some(b.run.imagebuilder_status),
            BuildingInfo::Done(b) => Some(b.run.imagebuilder_status),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for BuildingInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        BuildingInfo::from_value(value).map_err(serde::de::Error::custom)
    }
}
