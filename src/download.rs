//! Download module
//!
//! Downloads the images of a finished build and verifies each against the
//! SHA256 published in the build result.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::asu::ImageInfo;
use crate::error::{Error, Result};
use crate::utils::{bytes_to_mb, format_size, join_url};
use crate::{log_debug, log_error, log_info, log_warn};

const MODULE: &str = "download";

/// Progress of the running download
#[derive(Debug, Default)]
pub struct DownloadState {
    pub total_bytes: AtomicU64,
    pub downloaded_bytes: AtomicU64,
    pub is_cancelled: AtomicBool,
    is_downloading: AtomicBool,
}

impl DownloadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.total_bytes.store(0, Ordering::SeqCst);
        self.downloaded_bytes.store(0, Ordering::SeqCst);
    }

    pub fn cancel(&self) {
        self.is_cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled.load(Ordering::SeqCst)
    }

    /// True while a download owns a partial file on disk
    pub fn is_downloading(&self) -> bool {
        self.is_downloading.load(Ordering::SeqCst)
    }
}

/// Clears the in-progress flag however the download ends
struct Downloading<'a>(&'a DownloadState);

impl<'a> Downloading<'a> {
    fn start(state: &'a DownloadState) -> Self {
        state.is_downloading.store(true, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for Downloading<'_> {
    fn drop(&mut self) {
        self.0.is_downloading.store(false, Ordering::SeqCst);
    }
}

/// Check that an image name from a build result is a plain file name
fn safe_file_name(name: &str) -> Result<&str> {
    let plain = !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if plain {
        Ok(name)
    } else {
        log_error!(MODULE, "Refusing unsafe image name: {:?}", name);
        Err(Error::InvalidImageName(name.to_string()))
    }
}

/// Download one image from `base_url` into `output_dir`.
///
/// Data goes to `<name>.downloading` and is renamed once the checksum
/// matches. Any failure removes the partial file.
pub async fn download_image(
    client: &Client,
    base_url: &str,
    image: &ImageInfo,
    output_dir: &Path,
    state: Arc<DownloadState>,
) -> Result<PathBuf> {
    let name = safe_file_name(&image.name)?;
    state.reset();

    let url = join_url(base_url, name);
    let output_path = output_dir.join(name);
    let temp_path = output_dir.join(format!("{}.downloading", name));

    log_info!(MODULE, "Downloading {}", url);
    tokio::fs::create_dir_all(output_dir).await?;

    let response = client.get(&url).send().await.map_err(|e| {
        log_error!(MODULE, "Failed to start download: {}", e);
        Error::Transport {
            url: url.clone(),
            source: e,
        }
    })?;

    if !response.status().is_success() {
        log_error!(MODULE, "Download failed with status: {}", response.status());
        return Err(Error::HttpStatus {
            url,
            status: response.status().as_u16(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    state.total_bytes.store(total_size, Ordering::SeqCst);
    log_debug!(MODULE, "Download size: {}", format_size(total_size));

    let _downloading = Downloading::start(&state);
    let saved = async {
        let (downloaded, actual) = write_verified(response, &url, &temp_path, &state).await?;
        verify_checksum(image, actual)?;
        tokio::fs::rename(&temp_path, &output_path).await?;
        Ok::<_, Error>(downloaded)
    }
    .await;

    match saved {
        Ok(downloaded) => {
            log_info!(
                MODULE,
                "Saved {} ({:.2} MB)",
                output_path.display(),
                bytes_to_mb(downloaded)
            );
            Ok(output_path)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(e)
        }
    }
}

/// Stream the body into `temp_path`, returning its size and hex SHA256
async fn write_verified(
    response: reqwest::Response,
    url: &str,
    temp_path: &Path,
    state: &DownloadState,
) -> Result<(u64, String)> {
    let mut file = tokio::fs::File::create(temp_path).await?;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        if state.is_cancelled() {
            log_info!(MODULE, "Download cancelled by user");
            return Err(Error::Cancelled);
        }

        let chunk = chunk.map_err(|e| Error::Transport {
            url: url.to_string(),
            source: e,
        })?;
        hasher.update(&chunk);
        file.write_all(&chunk).await?;

        downloaded += chunk.len() as u64;
        state.downloaded_bytes.store(downloaded, Ordering::SeqCst);
    }
    file.flush().await?;

    Ok((downloaded, hex::encode(hasher.finalize())))
}

fn verify_checksum(image: &ImageInfo, actual: String) -> Result<()> {
    let expected = image.sha256.to_lowercase();
    if expected.is_empty() {
        log_warn!(MODULE, "No SHA256 published for {}, skipping verification", image.name);
    } else if expected != actual {
        log_error!(
            MODULE,
            "SHA256 verification FAILED for {}! Expected: {}, Got: {}",
            image.name,
            expected,
            actual
        );
        return Err(Error::ChecksumMismatch {
            name: image.name.clone(),
            expected,
            actual,
        });
    } else {
        log_debug!(MODULE, "SHA256 verification passed for {}", image.name);
    }
    Ok(())
}

/// Download several images in order, stopping at the first failure
pub async fn download_images(
    client: &Client,
    base_url: &str,
    images: &[&ImageInfo],
    output_dir: &Path,
    state: Arc<DownloadState>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(images.len());
    for image in images {
        paths.push(download_image(client, base_url, image, output_dir, state.clone()).await?);
    }
    Ok(paths)
}
