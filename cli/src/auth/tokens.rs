//! Token types for authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token bundle returned by the client-credentials grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// The access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Lifetime in seconds as reported by the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// When the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenBundle {
    /// Build a bundle, deriving the absolute expiry from `expires_in`.
    #[must_use]
    pub fn new(access_token: &str, token_type: &str, expires_in: Option<u64>) -> Self {
        let expires_at = expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

        Self {
            access_token: access_token.to_string(),
            token_type: token_type.to_string(),
            expires_in,
            expires_at,
        }
    }

    /// Check if the access token is expired or will expire within 5 minutes.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| exp <= Utc::now() + Duration::minutes(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_expired() {
        let token = TokenBundle::new("abc", "Bearer", Some(3599));
        assert!(!token.is_expired());
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn short_lived_token_counts_as_expired() {
        let token = TokenBundle::new("abc", "Bearer", Some(60));
        assert!(token.is_expired());
    }

    #[test]
    fn out_of_range_lifetime_leaves_expiry_unset() {
        for secs in [u64::MAX, i64::MAX as u64, 1 << 50] {
            let token = TokenBundle::new("abc", "Bearer", Some(secs));
            assert_eq!(token.expires_in, Some(secs));
            assert_eq!(token.expires_at, None);
            assert!(!token.is_expired());
        }
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = TokenBundle::new("abc", "Bearer", None);
        assert!(!token.is_expired());
    }
}
