//! Client-credentials token exchange.

use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, ClientId, ClientSecret, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use tracing::{debug, info};

use crate::auth::endpoints::{authorize_url, token_url};
use crate::auth::tokens::TokenBundle;
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, Result};

/// Build an OAuth2 client for the configured tenant and application.
fn build_client(config: &ConnectorConfig) -> Result<BasicClient> {
    let asset = &config.asset;
    if asset.client_id.is_empty() || asset.client_secret.is_empty() {
        return Err(ConnectorError::Config(
            "client_id and client_secret must be configured".to_string(),
        ));
    }

    let auth_url = AuthUrl::from_url(authorize_url(&config.graph, &asset.tenant)?);
    let token_url = TokenUrl::from_url(token_url(&config.graph, &asset.tenant)?);

    Ok(BasicClient::new(
        ClientId::new(asset.client_id.clone()),
        Some(ClientSecret::new(asset.client_secret.clone())),
        auth_url,
        Some(token_url),
    )
    .set_auth_type(AuthType::RequestBody))
}

/// Exchange the application credentials for an access token.
///
/// # Errors
///
/// Returns [`ConnectorError::TokenExchange`] if the identity provider rejects
/// the request or cannot be reached, and [`ConnectorError::Config`] if the
/// credentials are not configured.
pub async fn exchange_client_credentials(config: &ConnectorConfig) -> Result<TokenBundle> {
    let client = build_client(config)?;
    debug!(tenant = %config.asset.tenant, "Requesting client-credentials token");

    let response = client
        .exchange_client_credentials()
        .add_scope(Scope::new(config.graph.scope.clone()))
        .request_async(async_http_client)
        .await
        .map_err(|e| match e {
            RequestTokenError::ServerResponse(resp) => ConnectorError::TokenExchange(resp.to_string()),
            RequestTokenError::Request(e) => {
                ConnectorError::TokenExchange(format!("request failed: {e}"))
            }
            RequestTokenError::Parse(e, _) => {
                ConnectorError::TokenExchange(format!("unreadable token response: {e}"))
            }
            RequestTokenError::Other(msg) => ConnectorError::TokenExchange(msg),
        })?;

    let token = TokenBundle::new(
        response.access_token().secret(),
        "Bearer",
        response.expires_in().map(|d| d.as_secs()),
    );
    info!(expires_at = ?token.expires_at, "Obtained access token");

    Ok(token)
}
