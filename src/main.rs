//! Firmware Selector - command-line front-end
//!
//! Browse firmware versions and device profiles, then request custom images
//! from the build service.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use firmware_selector::commands::build::{build_status, request_build, BuildOptions};
use firmware_selector::commands::catalog::{list_profiles, list_versions, show_device};
use firmware_selector::commands::AppState;
use firmware_selector::config::{self, Config};
use firmware_selector::{log_error, log_info, logging, Result};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List firmware versions
    Versions {
        /// Include versions older than the recent major threshold
        #[arg(long)]
        all: bool,
    },
    /// Search the device profiles of a version
    Profiles {
        version: String,
        /// Matches vendor, model, variant or profile id
        #[arg(default_value = "")]
        query: String,
    },
    /// Show a device's details and prebuilt images
    Device { version: String, profile: String },
    /// Request a custom image build
    Build {
        version: String,
        profile: String,
        /// Packages to add (comma or space separated, repeatable)
        #[arg(long)]
        add: Vec<String>,
        /// Packages to remove (comma or space separated, repeatable)
        #[arg(long)]
        remove: Vec<String>,
        /// Root filesystem size in MB
        #[arg(long)]
        rootfs_size: Option<u32>,
        /// Script to run on first boot (uci-defaults)
        #[arg(long)]
        defaults_file: Option<PathBuf>,
        /// Return right after submitting instead of following the build
        #[arg(long)]
        no_wait: bool,
        /// Download and verify the images into this directory
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// Show the status of a build by request hash
    Status {
        hash: String,
        /// Keep polling until the build finishes
        #[arg(long)]
        wait: bool,
        /// Download and verify the images into this directory
        #[arg(long)]
        download: Option<PathBuf>,
    },
}

async fn run(args: Args, state: &AppState) -> Result<bool> {
    match args.cmd {
        Command::Versions { all } => list_versions(state, all).await.map(|_| true),
        Command::Profiles { version, query } => {
            list_profiles(state, &version, &query).await.map(|_| true)
        }
        Command::Device { version, profile } => {
            show_device(state, &version, &profile).await.map(|_| true)
        }
        Command::Build {
            version,
            profile,
            add,
            remove,
            rootfs_size,
            defaults_file,
            no_wait,
            download,
        } => {
            request_build(
                state,
                BuildOptions {
                    version,
                    profile,
                    add,
                    remove,
                    rootfs_size_mb: rootfs_size,
                    defaults_file,
                    wait: !no_wait,
                    download_dir: download,
                },
            )
            .await
        }
        Command::Status {
            hash,
            wait,
            download,
        } => build_status(state, &hash, wait, download).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    logging::init();
    logging::set_log_level(args.verbose);

    let config = Config::from_env();
    log_info!("main", "=== Firmware Selector {} ===", config::app::VERSION);
    log_info!("main", "Download mirror: {}", config.download_url);
    log_info!("main", "Build service: {}", config.asu_url);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            log_error!("main", "Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let download_state = state.download_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_info!("main", "Interrupted, cancelling");
            download_state.cancel();
            // A running download removes its partial file and returns
            if !download_state.is_downloading() {
                std::process::exit(130);
            }
        }
    });

    match run(args, &state).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            log_error!("main", "{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
