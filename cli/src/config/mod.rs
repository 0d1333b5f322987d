//! Configuration management.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{ConnectorConfig, ConsentConfig, GraphConfig};

use std::path::Path;

use crate::error::{ConnectorError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<ConnectorConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<ConnectorConfig> {
    if !path.exists() {
        return Ok(ConnectorConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: ConnectorConfig =
        toml::from_str(&contents).map_err(|e| ConnectorError::ConfigRead(e.to_string()))?;

    Ok(config.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config_from(&temp_dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.consent.poll_attempts, 40);
        assert_eq!(
            config.graph.api_base_url.as_str(),
            "https://graph.microsoft.com/v1.0"
        );
    }

    #[test]
    fn reads_asset_section_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[asset]
id = "42"
name = "o365_prod"
client_id = "client-abc"
client_secret = "s3cret"
tenant = "contoso.onmicrosoft.com"

[consent]
poll_attempts = 5
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.asset.name, "o365_prod");
        assert_eq!(config.asset.tenant, "contoso.onmicrosoft.com");
        assert_eq!(config.consent.poll_attempts, 5);
        assert_eq!(config.consent.initial_delay_secs, 5);
    }

    #[test]
    fn malformed_toml_is_config_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[asset\nid = ").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConnectorError::ConfigRead(_))));
    }
}
