//! Response classification.
//!
//! Rules, first match wins:
//! 1. JSON content type: parse the body; a 2xx/3xx status (below 399) is a
//!    success, anything else an error. Unparseable JSON is an error even on 200.
//! 2. HTML content type: always an error. Proxies and gateways answer with
//!    HTML pages, so the markup is stripped and the text surfaced.
//! 3. Empty body: success with an empty object only on exactly 200.
//! 4. Anything else: error citing status and raw body.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConnectorError, Result};

/// Uniform result of a REST call.
#[derive(Debug)]
pub enum RestCallOutcome {
    /// Parsed payload. Empty responses carry an empty JSON object.
    Success(Value),
    /// Classified failure.
    Error(ConnectorError),
}

impl RestCallOutcome {
    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert into a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }
}

impl From<ConnectorError> for RestCallOutcome {
    fn from(err: ConnectorError) -> Self {
        Self::Error(err)
    }
}

/// Classify a received response.
pub async fn classify_response(response: reqwest::Response) -> RestCallOutcome {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return ConnectorError::from(e).into(),
    };

    debug!(status, content_type = %content_type, body_len = body.len(), "Classifying response");
    classify(status, &content_type, &body)
}

/// Classify a response from its status, `Content-Type` header and body.
#[must_use]
pub fn classify(status: u16, content_type: &str, body: &str) -> RestCallOutcome {
    if content_type.contains("json") || content_type.contains("javascript") {
        return classify_json(status, body);
    }

    if content_type.contains("html") {
        return RestCallOutcome::Error(ConnectorError::HttpStatus {
            status,
            message: escape_braces(&html_error_text(body)),
        });
    }

    if body.is_empty() {
        if status == 200 {
            return RestCallOutcome::Success(Value::Object(serde_json::Map::new()));
        }
        return RestCallOutcome::Error(ConnectorError::HttpStatus {
            status,
            message: "Empty response and no information in the header".to_string(),
        });
    }

    RestCallOutcome::Error(ConnectorError::MalformedResponse(format!(
        "Can't process response from server. Status Code: {status} Data from server: {}",
        escape_braces(body)
    )))
}

fn classify_json(status: u16, body: &str) -> RestCallOutcome {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            return RestCallOutcome::Error(ConnectorError::MalformedResponse(format!(
                "Unable to parse JSON response. Error: {e}"
            )));
        }
    };

    if (200..399).contains(&status) {
        RestCallOutcome::Success(parsed)
    } else {
        RestCallOutcome::Error(ConnectorError::HttpStatus {
            status,
            message: escape_braces(body),
        })
    }
}

/// Visible text of an HTML page, one non-blank trimmed line per line.
fn html_error_text(html: &str) -> String {
    static HIDDEN: OnceLock<Regex> = OnceLock::new();
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();

    let hidden = HIDDEN.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("valid regex")
    });
    // Block-level tags end a line; inline tags vanish in place.
    let block = BLOCK.get_or_init(|| {
        Regex::new(r"(?is)<\s*/?\s*(p|div|br|h[1-6]|tr|li|title)\b[^>]*>").expect("valid regex")
    });
    let tag = TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

    let without_hidden = hidden.replace_all(html, "");
    let broken = block.replace_all(&without_hidden, "\n");
    let text = tag.replace_all(&broken, "");
    let text = decode_entities(&text);

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        "Cannot parse error details".to_string()
    } else {
        lines.join("\n")
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Double literal braces so hosts that treat messages as format strings
/// print them verbatim.
fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}
