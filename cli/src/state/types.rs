//! Asset state types.

use serde::{Deserialize, Serialize};

use crate::auth::TokenBundle;

/// Recorded outcome of the admin consent prompt.
///
/// Serialized as a plain boolean so state files stay readable by older
/// tooling that wrote `"admin_consent": true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum AdminConsent {
    Granted,
    Denied,
}

impl From<bool> for AdminConsent {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

impl From<AdminConsent> for bool {
    fn from(consent: AdminConsent) -> Self {
        matches!(consent, AdminConsent::Granted)
    }
}

/// State persisted for one asset between action invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetState {
    /// Unset until the redirect handler records a consent result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_consent: Option<AdminConsent>,

    /// Callback URL handed to the identity provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Authorization URL the start route redirects the operator to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_consent_url: Option<String>,

    /// Last token obtained through the client-credentials grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenBundle>,
}

impl AssetState {
    /// Fresh state for a new consent attempt. Replaces whatever was pending.
    #[must_use]
    pub fn pending_consent(redirect_uri: String, admin_consent_url: String) -> Self {
        Self {
            redirect_uri: Some(redirect_uri),
            admin_consent_url: Some(admin_consent_url),
            ..Self::default()
        }
    }

    /// Whether an administrator granted consent.
    #[must_use]
    pub fn consent_granted(&self) -> bool {
        self.admin_consent == Some(AdminConsent::Granted)
    }

    /// Access token of the stored bundle, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.access_token.as_str())
    }
}
