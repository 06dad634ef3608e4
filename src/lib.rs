//! Firmware Selector - pick a device, firmware version and package set, then
//! request a custom image from the build service and follow it to completion.
//!
//! The heavy lifting happens on two remote services: a static download
//! mirror (versions, profiles, prebuilt images) and the asynchronous image
//! build service.

pub mod logging;

pub mod asu;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod mirror;
pub mod packages;
pub mod selection;
pub mod utils;

pub use error::{Error, Result};
