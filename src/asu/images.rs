//! Image list ordering
//!
//! Orders the images of a device profile for display: by a fixed type
//! priority, then disambiguated by filesystem when several images share a
//! type.

use std::collections::HashMap;

use crate::utils::join_url;

use super::models::ImageInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Sysupgrade,
    Factory,
    FactoryUbi,
    Rootfs,
    Other,
}

impl ImageKind {
    pub fn from_type(image_type: &str) -> Self {
        match image_type {
            "sysupgrade" => ImageKind::Sysupgrade,
            "factory" => ImageKind::Factory,
            "factory-ubi" => ImageKind::FactoryUbi,
            "rootfs" => ImageKind::Rootfs,
            _ => ImageKind::Other,
        }
    }

    pub fn priority(self) -> u8 {
        match self {
            ImageKind::Sysupgrade => 0,
            ImageKind::Factory => 1,
            ImageKind::FactoryUbi => 2,
            ImageKind::Rootfs => 3,
            ImageKind::Other => 4,
        }
    }
}

/// An image with its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledImage<'a> {
    pub label: String,
    pub image: &'a ImageInfo,
}

/// An image with its display label and download URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLink {
    pub label: String,
    pub name: String,
    pub url: String,
    pub sha256: String,
}

/// Sort images by type priority, type name and filesystem, labelling
/// each as `type` or `type (filesystem)` when its type is shared
pub fn ordered_images(images: &[ImageInfo]) -> Vec<LabeledImage<'_>> {
    let mut per_type: HashMap<&str, usize> = HashMap::new();
    for image in images {
        *per_type.entry(image.image_type.as_str()).or_default() += 1;
    }

    let mut sorted: Vec<&ImageInfo> = images.iter().collect();
    sorted.sort_by(|a, b| {
        a.kind()
            .priority()
            .cmp(&b.kind().priority())
            .then_with(|| a.image_type.cmp(&b.image_type))
            .then_with(|| a.filesystem.cmp(&b.filesystem))
            .then_with(|| a.name.cmp(&b.name))
    });

    sorted
        .into_iter()
        .map(|image| {
            let shared = per_type.get(image.image_type.as_str()).copied().unwrap_or(0) > 1;
            let label = match (&image.filesystem, shared) {
                (Some(fs), true) => format!("{} ({})", image.image_type, fs),
                _ => image.image_type.clone(),
            };
            LabeledImage { label, image }
        })
        .collect()
}

/// [`ordered_images`] with download URLs under `base_url`
pub fn image_links(base_url: &str, images: &[ImageInfo]) -> Vec<ImageLink> {
    ordered_images(images)
        .into_iter()
        .map(|entry| ImageLink {
            label: entry.label,
            name: entry.image.name.clone(),
            url: join_url(base_url, &entry.image.name),
            sha256: entry.image.sha256.clone(),
        })
        .collect()
}
