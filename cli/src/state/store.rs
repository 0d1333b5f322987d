//! Asset state storage.
//!
//! This module provides the durable side channel of the consent handshake:
//! - [`StateStore`] - Trait for state and completion marker operations
//! - [`FileStateStore`] - JSON file plus zero-byte marker file per asset

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{ConnectorError, Result};
use crate::state::types::AssetState;

const STATE_FILE_SUFFIX: &str = "_state.json";
const MARKER_FILE_SUFFIX: &str = "_oauth_task.out";

/// Trait for per-asset state storage (enables mocking).
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    /// Loads the state for an asset.
    ///
    /// An unknown asset yields an empty state, not an error.
    fn load(&self, asset_id: &str) -> Result<AssetState>;

    /// Overwrites the state for an asset wholesale.
    fn save(&self, asset_id: &str, state: &AssetState) -> Result<()>;

    /// Signals that a consent callback for the asset was handled.
    fn mark_complete(&self, asset_id: &str) -> Result<()>;

    /// Consumes the completion signal.
    ///
    /// Returns `true` exactly once per [`mark_complete`](Self::mark_complete).
    fn take_completion(&self, asset_id: &str) -> Result<bool>;
}

/// File-based state storage implementation.
pub struct FileStateStore {
    base_dir: PathBuf,
}

impl FileStateStore {
    /// Creates a store rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
        }
        Ok(Self { base_dir })
    }

    fn state_path(&self, asset_id: &str) -> PathBuf {
        self.base_dir.join(format!("{asset_id}{STATE_FILE_SUFFIX}"))
    }

    fn marker_path(&self, asset_id: &str) -> PathBuf {
        self.base_dir.join(format!("{asset_id}{MARKER_FILE_SUFFIX}"))
    }

    /// Validates an asset id before it becomes part of a file name.
    ///
    /// Asset ids arrive from callback query strings, so they are untrusted.
    fn validate_asset_id(asset_id: &str) -> Result<()> {
        if asset_id.is_empty() {
            return Err(ConnectorError::InvalidAssetId(
                asset_id.to_string(),
                "asset id cannot be empty".to_string(),
            ));
        }

        if asset_id.contains('/') || asset_id.contains('\\') || asset_id.contains("..") {
            return Err(ConnectorError::InvalidAssetId(
                asset_id.to_string(),
                "asset id cannot contain path separators".to_string(),
            ));
        }

        if asset_id.len() > 100 {
            return Err(ConnectorError::InvalidAssetId(
                asset_id.to_string(),
                "asset id too long (max 100 characters)".to_string(),
            ));
        }

        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load(&self, asset_id: &str) -> Result<AssetState> {
        Self::validate_asset_id(asset_id)?;

        let path = self.state_path(asset_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AssetState::default()),
            Err(e) => return Err(e.into()),
        };

        let state = serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(asset_id, error = %e, "Discarding unreadable asset state");
            AssetState::default()
        });
        debug!(asset_id, "Loaded asset state");

        Ok(state)
    }

    fn save(&self, asset_id: &str, state: &AssetState) -> Result<()> {
        Self::validate_asset_id(asset_id)?;

        let path = self.state_path(asset_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)?;

        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| ConnectorError::StateStorage(format!("{}: {e}", path.display())))?;
        debug!(asset_id, "Saved asset state");

        Ok(())
    }

    fn mark_complete(&self, asset_id: &str) -> Result<()> {
        Self::validate_asset_id(asset_id)?;

        let path = self.marker_path(asset_id);
        fs::File::create(&path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // The web server and the action runner may run as different users.
            if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(0o664)) {
                warn!(asset_id, error = %e, "Could not relax completion marker permissions");
            }
        }

        Ok(())
    }

    fn take_completion(&self, asset_id: &str) -> Result<bool> {
        Self::validate_asset_id(asset_id)?;

        match fs::remove_file(self.marker_path(asset_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
