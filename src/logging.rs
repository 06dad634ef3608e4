//! Logging
//!
//! Small leveled logger used through the `log_*!` macros. Lines go to stderr
//! and, once [`init`] has opened it, to a log file in the cache directory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use once_cell::sync::OnceCell;

use crate::config;
use crate::utils::get_cache_dir;

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_FILE: OnceCell<Mutex<File>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Open the log file under the application cache directory.
///
/// Failing to open the file is not fatal; logging then only goes to stderr.
pub fn init() {
    let dir = get_cache_dir(config::app::NAME).join("logs");
    if let Err(e) = init_with_dir(&dir) {
        eprintln!("Failed to open log file in {}: {}", dir.display(), e);
    }
}

fn init_with_dir(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.log", config::app::NAME));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(path)
}

/// Switch between DEBUG (true) and INFO (false) verbosity
pub fn set_log_level(debug: bool) {
    DEBUG_ENABLED.store(debug, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

fn format_line(level: Level, module: &str, message: &str) -> String {
    format!(
        "{} [{}] [{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level.as_str(),
        module,
        message
    )
}

/// Backend of the logging macros
pub fn log(level: Level, module: &str, message: &str) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }

    let line = format_line(level, module, message);
    eprintln!("{}", line);

    if let Some(file) = LOG_FILE.get() {
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Debug, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Info, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Warn, $module, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)*) => {
        $crate::logging::log($crate::logging::Level::Error, $module, &format!($($arg)*))
    };
}
