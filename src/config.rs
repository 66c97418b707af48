//! Runtime configuration for the PageMark binaries.
//!
//! Resolved from environment variables with platform defaults:
//!
//! - `PAGEMARK_DATA_DIR`: directory holding `pagemark.db`
//! - `PAGEMARK_AUTOSAVE_QUIET_MS`: scroll quiet period before auto-save
//! - `PAGEMARK_LOG`: tracing filter (read by [`init_logging`])

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::auto_save_scheduler::DEFAULT_QUIET_PERIOD;

const DB_FILE_NAME: &str = "pagemark.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub autosave_quiet_period: Duration,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("PAGEMARK_DATA_DIR")
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir(&lookup));

        let autosave_quiet_period = match lookup("PAGEMARK_AUTOSAVE_QUIET_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid PAGEMARK_AUTOSAVE_QUIET_MS");
                    DEFAULT_QUIET_PERIOD
                }
            },
            None => DEFAULT_QUIET_PERIOD,
        };

        Self { data_dir, autosave_quiet_period }
    }

    /// Path of the SQLite store file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

/// Platform data directory for PageMark.
///
/// - **Linux**: `$XDG_DATA_HOME/pagemark` or `~/.local/share/pagemark`
/// - **macOS**: `~/Library/Application Support/PageMark`
/// - **Windows**: `%APPDATA%/PageMark`
fn default_data_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if cfg!(target_os = "windows") {
        let appdata = lookup("APPDATA").unwrap_or_else(|| String::from("."));
        return PathBuf::from(appdata).join("PageMark");
    }
    let home = lookup("HOME").unwrap_or_else(|| String::from("/tmp"));
    if cfg!(target_os = "macos") {
        return PathBuf::from(home).join("Library").join("Application Support").join("PageMark");
    }
    match lookup("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        Some(xdg) => PathBuf::from(xdg).join("pagemark"),
        None => PathBuf::from(home).join(".local").join("share").join("pagemark"),
    }
}

/// Installs the stderr tracing subscriber used by the binaries.
///
/// The filter comes from `PAGEMARK_LOG` (e.g. `debug`, `pagemark=trace`),
/// defaulting to `info`. Stdout is left free for protocol output.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("PAGEMARK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
