//! Microsoft identity platform endpoints and host callback URLs.

use url::Url;

use crate::config::{ConnectorConfig, GraphConfig};
use crate::error::{ConnectorError, Result};

/// Directory name used when the app name has no usable characters.
const FALLBACK_APP_DIR: &str = "app_for_phantom";

/// Reduce an app display name to the directory name the host serves it under.
///
/// Keeps ASCII alphanumerics only, lowercased.
#[must_use]
pub fn app_dir_name(app_name: &str) -> String {
    let dir: String = app_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if dir.is_empty() {
        FALLBACK_APP_DIR.to_string()
    } else {
        dir
    }
}

/// URL of this app's REST handler on the host platform for the configured asset.
#[must_use]
pub fn app_rest_url(config: &ConnectorConfig) -> String {
    format!(
        "{}/rest/handler/{}_{}/{}",
        config.platform.base_url.as_str().trim_end_matches('/'),
        app_dir_name(&config.platform.app_name),
        config.platform.app_id,
        config.asset.name
    )
}

/// Callback URL the identity provider redirects to after the consent prompt.
#[must_use]
pub fn redirect_uri(app_rest_url: &str) -> String {
    format!("{app_rest_url}/result")
}

/// URL shown to the operator; it bounces to the stored admin consent URL.
#[must_use]
pub fn operator_start_url(app_rest_url: &str, asset_id: &str) -> String {
    format!("{app_rest_url}/start_oauth?asset_id={asset_id}&")
}

/// Tenant-wide admin consent authorization URL.
///
/// The asset id travels as `state` and comes back on the callback.
pub fn admin_consent_url(
    graph: &GraphConfig,
    tenant: &str,
    client_id: &str,
    redirect_uri: &str,
    asset_id: &str,
) -> Result<Url> {
    let mut url = tenant_endpoint(&graph.login_base_url, tenant, "adminconsent")?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("state", asset_id);
    Ok(url)
}

/// OAuth2 v2.0 authorize endpoint for a tenant.
pub fn authorize_url(graph: &GraphConfig, tenant: &str) -> Result<Url> {
    tenant_endpoint(&graph.login_base_url, tenant, "oauth2/v2.0/authorize")
}

/// OAuth2 v2.0 token endpoint for a tenant.
pub fn token_url(graph: &GraphConfig, tenant: &str) -> Result<Url> {
    tenant_endpoint(&graph.login_base_url, tenant, "oauth2/v2.0/token")
}

fn tenant_endpoint(base: &Url, tenant: &str, path: &str) -> Result<Url> {
    if tenant.is_empty() {
        return Err(ConnectorError::Config("tenant is not configured".to_string()));
    }
    let raw = format!("{}/{tenant}/{path}", base.as_str().trim_end_matches('/'));
    Ok(Url::parse(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_dir_name_keeps_lowercase_alphanumerics() {
        assert_eq!(app_dir_name("Office 365"), "office365");
        assert_eq!(app_dir_name("MS-Graph (Mail)"), "msgraphmail");
        assert_eq!(app_dir_name("  --  "), "app_for_phantom");
    }

    #[test]
    fn app_rest_url_combines_platform_and_asset() {
        let mut config = ConnectorConfig::default();
        config.platform.base_url = Url::parse("https://soar.example.com/").unwrap();
        config.platform.app_id = "abc123".to_string();
        config.asset.name = "mail_prod".to_string();

        let url = app_rest_url(&config);
        assert_eq!(
            url,
            "https://soar.example.com/rest/handler/office365_abc123/mail_prod"
        );
        assert_eq!(redirect_uri(&url), format!("{url}/result"));
        assert_eq!(
            operator_start_url(&url, "7"),
            format!("{url}/start_oauth?asset_id=7&")
        );
    }

    #[test]
    fn admin_consent_url_embeds_client_redirect_and_state() {
        let graph = GraphConfig::default();
        let url = admin_consent_url(
            &graph,
            "contoso.onmicrosoft.com",
            "client-abc",
            "https://soar.example.com/rest/handler/office365_o365/prod/result",
            "7",
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("login.microsoftonline.com"));
        assert_eq!(url.path(), "/contoso.onmicrosoft.com/adminconsent");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client-abc".into())));
        assert!(pairs.contains(&("state".into(), "7".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://soar.example.com/rest/handler/office365_o365/prod/result".into()
        )));
    }

    #[test]
    fn token_url_targets_v2_endpoint() {
        let url = token_url(&GraphConfig::default(), "tenant-1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }

    #[test]
    fn authorize_url_shares_tenant_prefix() {
        let url = authorize_url(&GraphConfig::default(), "tenant-1").unwrap();
        assert_eq!(url.path(), "/tenant-1/oauth2/v2.0/authorize");
    }

    #[test]
    fn empty_tenant_is_config_error() {
        let result = token_url(&GraphConfig::default(), "");
        assert!(matches!(result, Err(ConnectorError::Config(_))));
    }
}
