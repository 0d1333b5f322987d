//! Error types and result aliases for the connector.
//!
//! Every failure an action can hit maps to one [`ConnectorError`] variant
//! whose display text is the operator-facing message. Action entry points
//! convert these into failed action results instead of propagating them.

use thiserror::Error;

use crate::client::query::RangeError;

/// Main error type for connector operations.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Connection, DNS or timeout failure before any response arrived.
    #[error("Error connecting to server. Details: {0}")]
    Transport(String),

    /// Server answered with a non-success status and a readable body.
    #[error("Error from server. Status Code: {status} Data from server: {message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Body text or extracted error details.
        message: String,
    },

    /// Response content did not match its declared type.
    #[error("{0}")]
    MalformedResponse(String),

    /// The administrator declined consent, or consent never got recorded.
    #[error("Admin consent not received or not given. {0}")]
    ConsentDenied(String),

    /// No completion marker showed up within the polling budget.
    #[error("Authentication process does not seem to be completed. Timed out after {attempts} checks.")]
    ConsentTimeout {
        /// Number of polling attempts made.
        attempts: u32,
    },

    /// The consent callback omitted a required field.
    #[error("ERROR: {0} not found in URL")]
    ConsentMissingField(String),

    /// The consent callback carried no asset identifier.
    #[error("ERROR: Asset ID not found in URL")]
    MissingAssetId,

    /// An action parameter failed validation.
    #[error("{0}")]
    Validation(String),

    /// The client-credentials token request failed.
    #[error("Failed to get token: {0}")]
    TokenExchange(String),

    /// The token was issued but a test API call with it failed.
    #[error("Token verification failed. API to get users failed: {0}")]
    TokenVerification(String),

    /// Action exists but has no implementation yet.
    #[error("Action '{0}' not yet implemented")]
    NotImplemented(String),

    /// Action needs admin consent that was never granted.
    #[error("Please run test connectivity first to get an admin consent and generate a token that the app can use to make calls to the server")]
    ConsentRequired,

    /// Consent coordinator driven out of order.
    #[error("Consent flow is in phase '{actual}', expected '{expected}'")]
    InvalidPhase {
        /// Phase the operation requires.
        expected: &'static str,
        /// Phase the coordinator was in.
        actual: &'static str,
    },

    /// Asset identifier cannot be used as a storage key.
    #[error("Invalid asset id '{0}': {1}")]
    InvalidAssetId(String, String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// Failed to read or write persisted asset state.
    #[error("Asset state storage error: {0}")]
    StateStorage(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ConnectorError {
    /// Checks if this error ended a consent handshake.
    ///
    /// Used to decide whether the operator should simply retry test
    /// connectivity.
    #[must_use]
    pub const fn is_consent_failure(&self) -> bool {
        matches!(
            self,
            Self::ConsentDenied(_)
                | Self::ConsentTimeout { .. }
                | Self::ConsentMissingField(_)
                | Self::MissingAssetId
                | Self::ConsentRequired
        )
    }
}

/// Result type alias using [`ConnectorError`].
pub type Result<T> = std::result::Result<T, ConnectorError>;

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for ConnectorError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<RangeError> for ConnectorError {
    fn from(err: RangeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for ConnectorError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_denial_messages_differ() {
        let timeout = ConnectorError::ConsentTimeout { attempts: 40 }.to_string();
        let denied = ConnectorError::ConsentDenied("declined".to_string()).to_string();

        assert!(timeout.contains("Timed out"));
        assert!(denied.contains("not given"));
        assert_ne!(timeout, denied);
    }

    #[test]
    fn http_status_includes_status_and_message() {
        let err = ConnectorError::HttpStatus {
            status: 404,
            message: "Not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("Not found"));
    }

    #[test]
    fn missing_asset_id_is_distinct_from_missing_field() {
        let missing_id = ConnectorError::MissingAssetId.to_string();
        let missing_field = ConnectorError::ConsentMissingField("admin_consent".into()).to_string();

        assert!(missing_id.contains("Asset ID"));
        assert!(missing_field.contains("admin_consent"));
    }

    #[test]
    fn is_consent_failure_identifies_handshake_errors() {
        assert!(ConnectorError::ConsentTimeout { attempts: 1 }.is_consent_failure());
        assert!(ConnectorError::ConsentDenied(String::new()).is_consent_failure());
        assert!(ConnectorError::MissingAssetId.is_consent_failure());
        assert!(ConnectorError::ConsentRequired.is_consent_failure());

        assert!(!ConnectorError::Transport("dns".into()).is_consent_failure());
        assert!(!ConnectorError::TokenExchange("bad secret".into()).is_consent_failure());
        assert!(!ConnectorError::NotImplemented("copy_email".into()).is_consent_failure());
    }

    #[test]
    fn from_range_error_is_validation() {
        let err: ConnectorError = RangeError::MinGreaterThanMax.into();
        assert!(matches!(err, ConnectorError::Validation(_)));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: ConnectorError = json_err.into();
        assert!(matches!(err, ConnectorError::Serialization(_)));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConnectorError = io_err.into();
        assert!(matches!(err, ConnectorError::Io(_)));
    }

    #[test]
    fn from_url_parse_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: ConnectorError = url_err.into();
        assert!(matches!(err, ConnectorError::InvalidUrl(_)));
    }
}
