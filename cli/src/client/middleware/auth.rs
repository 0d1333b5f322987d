//! Authentication middleware for injecting Bearer tokens and JSON headers.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tokio::sync::RwLock;

const JSON: &str = "application/json";

/// Middleware that injects the Bearer token and fixed JSON headers into requests.
pub struct AuthMiddleware {
    access_token: Arc<RwLock<Option<String>>>,
}

impl AuthMiddleware {
    /// Create a new authentication middleware.
    #[must_use]
    pub fn new(access_token: Arc<RwLock<Option<String>>>) -> Self {
        Self { access_token }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        if let Some(token) = self.access_token.read().await.as_ref() {
            if let Ok(value) = format!("Bearer {token}").parse() {
                req.headers_mut().insert(AUTHORIZATION, value);
            } else {
                tracing::warn!("Access token contains characters not allowed in a header");
            }
        }

        let headers = req.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));

        next.run(req, extensions).await
    }
}
