//! Command implementations.

pub mod action;
pub mod callback;
pub mod info;
pub mod serve;

pub use action::handle_action;
pub use callback::handle_callback;
pub use info::{handle_actions, handle_completions, handle_status};
pub use serve::handle_serve;

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{load_config, load_config_from, ConnectorConfig};
use crate::error::Result;
use crate::state::FileStateStore;

/// Load configuration and apply the global command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<ConnectorConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(dir) = &cli.state_dir {
        config.storage.state_dir = Some(dir.clone());
    }
    if let Some(asset_id) = &cli.asset_id {
        config.asset.id.clone_from(asset_id);
    }

    Ok(config)
}

/// Open the state store the configuration points at.
pub fn open_store(config: &ConnectorConfig) -> Result<FileStateStore> {
    let dir: PathBuf = config.storage.resolve_state_dir()?;
    FileStateStore::new(dir)
}
