//! Microsoft Graph API client implementation.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use reqwest::{Client, Method};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::auth::TokenBundle;
use crate::client::middleware::AuthMiddleware;
use crate::client::response::{classify_response, RestCallOutcome};
use crate::config::GraphConfig;
use crate::error::{ConnectorError, Result};

/// One REST call against the Graph API.
#[derive(Debug, Clone)]
pub struct GraphRequest {
    method: Method,
    endpoint: String,
    params: Option<Vec<(String, String)>>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl GraphRequest {
    /// Start a request for `endpoint`, a path relative to the API base.
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: None,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Shorthand for a GET request.
    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Set query parameters.
    #[must_use]
    pub fn params(mut self, params: Option<Vec<(String, String)>>) -> Self {
        self.params = params;
        self
    }

    /// Set a JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add extra headers. Authorization, Accept and Content-Type are fixed
    /// by the client and cannot be overridden here.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Main API client for communicating with Microsoft Graph.
pub struct GraphClient {
    client: ClientWithMiddleware,
    base_url: Url,
    access_token: Arc<RwLock<Option<String>>>,
}

impl GraphClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let inner_client = Client::builder()
            .user_agent(format!("o365-connector/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let access_token: Arc<RwLock<Option<String>>> = Arc::new(RwLock::new(None));

        let client = ClientBuilder::new(inner_client)
            .with(AuthMiddleware::new(Arc::clone(&access_token)))
            .build();

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            access_token,
        })
    }

    /// Use `token` for subsequent calls.
    pub async fn set_token(&self, token: &TokenBundle) {
        *self.access_token.write().await = Some(token.access_token.clone());
    }

    /// Dispatch a request and classify the response.
    ///
    /// Never fails: transport errors come back as [`RestCallOutcome::Error`].
    pub async fn call(&self, request: GraphRequest) -> RestCallOutcome {
        let url = match self.endpoint_url(&request.endpoint) {
            Ok(url) => url,
            Err(e) => return e.into(),
        };
        debug!(method = %request.method, url = %url, "Calling Graph API");

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(body) = &request.body {
            match serde_json::to_string(body) {
                Ok(text) => builder = builder.body(text),
                Err(e) => return ConnectorError::from(e).into(),
            }
        }

        match builder.send().await {
            Ok(response) => classify_response(response).await,
            Err(e) => ConnectorError::from(e).into(),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let raw = format!("{}{endpoint}", self.base_url.as_str().trim_end_matches('/'));
        Ok(Url::parse(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn graph_config(server: &MockServer) -> GraphConfig {
        GraphConfig {
            api_base_url: Url::parse(&format!("{}/v1.0", server.uri())).unwrap(),
            timeout_secs: 5,
            ..GraphConfig::default()
        }
    }

    #[tokio::test]
    async fn call_attaches_bearer_and_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(query_param("$top", "1"))
            .and(header("Authorization", "Bearer tok-1"))
            .and(header("Accept", "application/json"))
            .and(header("Content-Type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"value": [{"id": "u1"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&graph_config(&server)).unwrap();
        client
            .set_token(&TokenBundle::new("tok-1", "Bearer", Some(3599)))
            .await;

        let request = GraphRequest::get("/users")
            .params(Some(vec![("$top".to_string(), "1".to_string())]));
        let value = client.call(request).await.into_result().unwrap();

        assert_eq!(value["value"][0]["id"], "u1");
    }

    #[tokio::test]
    async fn html_gateway_error_becomes_error_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users/a@b.com/messages"))
            .respond_with(
                ResponseTemplate::new(502).set_body_raw("<html>Bad Gateway</html>", "text/html"),
            )
            .mount(&server)
            .await;

        let client = GraphClient::new(&graph_config(&server)).unwrap();
        let outcome = client
            .call(GraphRequest::get("/users/a@b.com/messages"))
            .await;

        let err = outcome.into_result().unwrap_err();
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[tokio::test]
    async fn raw_query_string_in_endpoint_is_sent_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users/a@b.com/messages"))
            .and(query_param("$select", "subject"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&graph_config(&server)).unwrap();
        let outcome = client
            .call(GraphRequest::get("/users/a@b.com/messages?$select=subject"))
            .await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.0/users/a@b.com/messages/m1/copy"))
            .and(wiremock::matchers::body_json(
                serde_json::json!({"destinationId": "archive"}),
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "m2"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&graph_config(&server)).unwrap();
        let request = GraphRequest::new(Method::POST, "/users/a@b.com/messages/m1/copy")
            .body(serde_json::json!({"destinationId": "archive"}));

        let value = client.call(request).await.into_result().unwrap();
        assert_eq!(value["id"], "m2");
    }

    #[tokio::test]
    async fn extra_headers_cannot_replace_fixed_ones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/users"))
            .and(header("Prefer", "outlook.body-content-type=\"text\""))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let mut extra = HeaderMap::new();
        extra.insert("Prefer", "outlook.body-content-type=\"text\"".parse().unwrap());
        extra.insert(http::header::ACCEPT, "text/xml".parse().unwrap());

        let client = GraphClient::new(&graph_config(&server)).unwrap();
        let outcome = client.call(GraphRequest::get("/users").headers(extra)).await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let config = GraphConfig {
            api_base_url: Url::parse("http://127.0.0.1:9/v1.0").unwrap(),
            timeout_secs: 2,
            ..GraphConfig::default()
        };
        let client = GraphClient::new(&config).unwrap();

        let outcome = client.call(GraphRequest::get("/users")).await;
        assert!(matches!(
            outcome,
            RestCallOutcome::Error(ConnectorError::Transport(_))
        ));
    }
}
