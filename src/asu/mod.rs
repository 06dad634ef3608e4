//! Image build service
//!
//! Client, status model and polling for the asynchronous build-request API.

mod client;
mod images;
mod models;
mod poller;

pub use client::AsuClient;
pub use images::{image_links, ordered_images, ImageKind, ImageLink, LabeledImage};
pub use models::{
    BuildBase, BuildPhase, BuildRequest, BuildingInfo, DoneBuild, FailedBuild,
    ImageBuilderStatus, ImageInfo, LinuxKernel, QueuedBuild, RunInfo, StartedBuild,
    TargetDeviceProfile,
};
pub use poller::{status_stream, BuildPoller, BuildStatusSource, BuildTracker};
