//! Utility functions shared across the application
//!
//! Formatting helpers and cache path management.

mod format;
mod path;

pub use format::*;
pub use path::*;
