//! Build commands
//!
//! Request a custom image, follow its progress and fetch the results.

use std::path::PathBuf;

use crate::asu::{image_links, BuildPoller, BuildRequest, BuildingInfo, DoneBuild, ImageInfo};
use crate::download::download_images;
use crate::error::Result;
use crate::packages::{split_tokens, PackageEditor};
use crate::{log_info, log_warn};

use super::AppState;

const MODULE: &str = "commands::build";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub version: String,
    pub profile: String,
    /// Extra packages, comma or space separated
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub rootfs_size_mb: Option<u32>,
    pub defaults_file: Option<PathBuf>,
    pub wait: bool,
    pub download_dir: Option<PathBuf>,
}

/// Submit a build; returns false when the build did not succeed
pub async fn request_build(state: &AppState, options: BuildOptions) -> Result<bool> {
    let (summary, device) = state
        .selection
        .resolve_profile(&options.version, &options.profile)
        .await?;

    let mut editor = PackageEditor::seeded(
        device.default_packages.clone(),
        device.device_packages.clone(),
        &state.config.recommended_packages,
    );
    for text in &options.add {
        editor.add_tokens(text);
    }
    for token in options.remove.iter().flat_map(|text| split_tokens(text)) {
        if !editor.remove_token(&token) {
            log_warn!(MODULE, "Package {} is not selected", token);
        }
    }

    let defaults = match &options.defaults_file {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => String::new(),
    };

    let request = BuildRequest {
        version: options.version.clone(),
        target: summary.target.clone(),
        profile: summary.id.clone(),
        packages: editor.render(),
        defaults,
        rootfs_size_mb: options.rootfs_size_mb,
    };
    println!("Packages: {}", request.packages.join(" "));

    let info = state.asu().submit(&request).await?;
    print_status(&info);

    let Some(hash) = info.request_hash().map(str::to_string) else {
        return finish(state, info, options.download_dir).await;
    };
    println!("Request hash: {}", hash);

    if !options.wait || info.is_terminal() {
        return finish(state, info, options.download_dir).await;
    }

    let last = poller(state)
        .wait(state.asu(), &hash, Some(info), print_status)
        .await?;
    finish(state, last, options.download_dir).await
}

/// Show (and optionally follow) the status of an earlier build
pub async fn build_status(
    state: &AppState,
    hash: &str,
    wait: bool,
    download_dir: Option<PathBuf>,
) -> Result<bool> {
    let info = if wait {
        poller(state)
            .wait(state.asu(), hash, None, print_status)
            .await?
    } else {
        let info = state.asu().poll(hash).await?;
        print_status(&info);
        info
    };
    finish(state, info, download_dir).await
}

fn poller(state: &AppState) -> BuildPoller {
    BuildPoller::new(state.config.poll_interval, state.config.poll_timeout)
}

fn print_status(info: &BuildingInfo) {
    match info {
        BuildingInfo::Queued(q) => println!("queued (position {})", q.queue_position),
        BuildingInfo::Started(s) => println!("started: {}", s.run.imagebuilder_status.as_str()),
        BuildingInfo::Done(_) => println!("done"),
        BuildingInfo::Failed(_) => println!("failed"),
        BuildingInfo::Unsupported { detail, .. } => {
            println!("unsupported status: {}", detail.as_deref().unwrap_or("<missing>"))
        }
    }
}

async fn finish(state: &AppState, info: BuildingInfo, download_dir: Option<PathBuf>) -> Result<bool> {
    match info {
        BuildingInfo::Done(done) => {
            report_done(state, &done);
            if let Some(dir) = download_dir {
                download_done(state, &done, dir).await?;
            }
            Ok(true)
        }
        BuildingInfo::Failed(failed) => {
            eprintln!("{}", failed.stderr);
            Ok(false)
        }
        BuildingInfo::Unsupported { raw, .. } => {
            eprintln!("{}", raw);
            Ok(false)
        }
        // Not finished yet; only reached without --wait
        BuildingInfo::Queued(_) | BuildingInfo::Started(_) => Ok(true),
    }
}

fn report_done(state: &AppState, done: &DoneBuild) {
    let base_url = state.asu().image_base_url(&done.bin_dir);
    log_info!(
        MODULE,
        "Build {} done with {} packages",
        done.base.request_hash,
        done.manifest.len()
    );
    println!("Built at: {}", done.build_at);
    println!("Images:   {}", base_url);
    for link in image_links(&base_url, &done.profile.images) {
        println!("  {:<24} {}", link.label, link.url);
    }
}

async fn download_done(state: &AppState, done: &DoneBuild, dir: PathBuf) -> Result<()> {
    let base_url = state.asu().image_base_url(&done.bin_dir);
    let images: Vec<&ImageInfo> = done.profile.images.iter().collect();
    let paths = download_images(
        &state.http,
        &base_url,
        &images,
        &dir,
        state.download_state.clone(),
    )
    .await?;
    for path in paths {
        println!("Saved {}", path.display());
    }
    Ok(())
}
