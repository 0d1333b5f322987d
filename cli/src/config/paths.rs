//! Platform-specific path utilities.

use std::path::PathBuf;

use crate::error::{ConnectorError, Result};

const APP_DIR: &str = "o365-connector";

/// Get the configuration directory.
///
/// - Linux: `~/.config/o365-connector`
/// - macOS: `~/Library/Application Support/o365-connector`
/// - Windows: `%APPDATA%\o365-connector`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| ConnectorError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join(APP_DIR))
}

/// Get the data directory.
///
/// - Linux: `~/.local/share/o365-connector`
/// - macOS: `~/Library/Application Support/o365-connector`
/// - Windows: `%APPDATA%\o365-connector`
pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| ConnectorError::Config("Cannot determine data directory".to_string()))?;
    Ok(base.join(APP_DIR))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default directory holding per-asset state files and completion markers.
pub fn default_state_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("state"))
}
