//! Catalog commands
//!
//! Versions, profile search and device details.

use crate::asu::image_links;
use crate::error::Result;
use crate::mirror::{recent_versions, search_profiles};
use crate::utils::format_timestamp;
use crate::{log_debug, log_info};

use super::AppState;

const MODULE: &str = "commands::catalog";

/// Print the available versions, newest releases only unless `all`
pub async fn list_versions(state: &AppState, all: bool) -> Result<()> {
    let versions = state.mirror().fetch_versions().await?;
    let shown = if all {
        versions.versions_list.clone()
    } else {
        recent_versions(&versions.versions_list, state.config.recent_major_version)
    };
    log_debug!(
        MODULE,
        "Showing {} of {} versions",
        shown.len(),
        versions.versions_list.len()
    );

    for version in shown {
        if version == versions.stable_version {
            println!("{} (stable)", version);
        } else {
            println!("{}", version);
        }
    }
    Ok(())
}

/// Print profiles of `version` whose title or id matches `query`
pub async fn list_profiles(state: &AppState, version: &str, query: &str) -> Result<()> {
    let Some(overview) = state.selection.select_version(version).await? else {
        return Ok(());
    };
    let choices = search_profiles(&overview, query);
    log_info!(MODULE, "{} profiles match {:?}", choices.len(), query);

    for choice in choices {
        println!(
            "{:<48} {:<40} {}",
            choice.title, choice.profile.id, choice.profile.target
        );
    }
    Ok(())
}

/// Print the details and prebuilt images of one device
pub async fn show_device(state: &AppState, version: &str, profile_id: &str) -> Result<()> {
    let (summary, device) = state.selection.resolve_profile(version, profile_id).await?;

    let titles: Vec<String> = summary.titles.iter().map(|t| t.display()).collect();
    println!("{} {}", state.config.brand_name, device.version_number);
    println!("Model:     {}", titles.join(" / "));
    println!("Profile:   {}", summary.id);
    println!("Target:    {}", summary.target);
    println!("Kernel:    {}", device.linux_kernel.version);
    println!("Built:     {}", format_timestamp(device.source_date_epoch));
    println!("Revision:  {}", device.version_code);
    println!("Packages:  {}", device.default_packages.join(" "));
    println!("Device:    {}", device.device_packages.join(" "));

    let base_url = state.mirror().target_url(version, &summary.target);
    println!();
    for link in image_links(&base_url, &device.images) {
        println!("{:<24} {}", link.label, link.url);
        println!("{:<24} sha256 {}", "", link.sha256);
    }
    Ok(())
}
