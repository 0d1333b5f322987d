//! Application configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::paths::default_state_dir;
use crate::error::Result;

/// Main configuration for the connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// The configured asset (one tenant/credential set).
    pub asset: AssetConfig,
    /// Host platform settings used to build callback URLs.
    pub platform: PlatformConfig,
    /// Identity and Graph endpoint settings.
    pub graph: GraphConfig,
    /// Admin consent polling settings.
    pub consent: ConsentConfig,
    /// Persisted state location.
    pub storage: StorageConfig,
}

/// Asset identity and application credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Asset identifier; keys the state file and the completion marker.
    pub id: String,
    /// Asset name as it appears in the host's REST handler path.
    pub name: String,
    /// Azure AD application (client) id.
    pub client_id: String,
    /// Azure AD application secret.
    pub client_secret: String,
    /// Tenant id or domain.
    pub tenant: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
            name: "office365".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            tenant: "common".to_string(),
        }
    }
}

/// Host platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the host platform, as reachable from the operator's browser.
    #[serde(with = "url_serde")]
    pub base_url: Url,
    /// Display name of the app; reduced to the REST handler directory name.
    pub app_name: String,
    /// App identifier appended to the REST handler directory name.
    pub app_id: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://localhost:8443").expect("valid default URL"),
            app_name: "Office 365".to_string(),
            app_id: "o365".to_string(),
        }
    }
}

/// Identity provider and resource API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Resource API base URL.
    #[serde(with = "url_serde")]
    pub api_base_url: Url,
    /// Identity provider base URL (token and admin-consent endpoints).
    #[serde(with = "url_serde")]
    pub login_base_url: Url,
    /// Scope requested in the client-credentials grant.
    pub scope: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse("https://graph.microsoft.com/v1.0")
                .expect("valid default URL"),
            login_base_url: Url::parse("https://login.microsoftonline.com")
                .expect("valid default URL"),
            scope: "https://graph.microsoft.com/.default".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Admin consent wait policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    /// Delay after publishing the consent URL before polling starts.
    pub initial_delay_secs: u64,
    /// Number of marker checks before giving up.
    pub poll_attempts: u32,
    /// Sleep between marker checks.
    pub poll_interval_secs: u64,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 5,
            poll_attempts: 40,
            poll_interval_secs: 3,
        }
    }
}

impl ConsentConfig {
    /// Delay before the first marker check.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    /// Sleep between marker checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Persisted state location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for state files and markers. Platform data dir when unset.
    pub state_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the state directory, falling back to the platform default.
    pub fn resolve_state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_state_dir(),
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const ASSET_ID: &str = "O365_ASSET_ID";
    pub const CLIENT_ID: &str = "O365_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "O365_CLIENT_SECRET";
    pub const TENANT: &str = "O365_TENANT";
    pub const PLATFORM_URL: &str = "O365_PLATFORM_URL";
    pub const GRAPH_URL: &str = "O365_GRAPH_URL";
    pub const STATE_DIR: &str = "O365_STATE_DIR";
    pub const LOG_LEVEL: &str = "O365_LOG";
}

impl ConnectorConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        let string_overrides: [(&str, &mut String); 4] = [
            (env::ASSET_ID, &mut self.asset.id),
            (env::CLIENT_ID, &mut self.asset.client_id),
            (env::CLIENT_SECRET, &mut self.asset.client_secret),
            (env::TENANT, &mut self.asset.tenant),
        ];
        for (var, field) in string_overrides {
            if let Ok(value) = std::env::var(var) {
                *field = value;
            }
        }

        if let Ok(url) = std::env::var(env::PLATFORM_URL) {
            if let Ok(parsed) = Url::parse(&url) {
                self.platform.base_url = parsed;
            }
        }

        if let Ok(url) = std::env::var(env::GRAPH_URL) {
            if let Ok(parsed) = Url::parse(&url) {
                self.graph.api_base_url = parsed;
            }
        }

        if let Ok(dir) = std::env::var(env::STATE_DIR) {
            self.storage.state_dir = Some(PathBuf::from(dir));
        }

        self
    }
}
