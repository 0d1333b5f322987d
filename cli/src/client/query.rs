//! Message listing query construction.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Largest accepted end offset.
pub const MAX_END_OFFSET: i64 = 2_147_483_646;

/// Range used when the caller gives none.
pub const DEFAULT_RANGE: &str = "0-10";

/// Reasons a `min-max` range string is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Unable to parse the range. Please specify the range as min_offset-max_offset")]
    Unparseable,

    #[error("Invalid min or max offset value specified in range")]
    NegativeOffset,

    #[error("Invalid range value, min_offset greater than max_offset")]
    MinGreaterThanMax,

    #[error("Invalid range value. The max_offset value cannot be greater than {}", MAX_END_OFFSET)]
    MaxTooLarge,
}

/// Inclusive offset window over a message listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailRange {
    min: i64,
    max: i64,
}

impl EmailRange {
    /// Page size: `max - min + 1`.
    #[must_use]
    pub const fn top(&self) -> i64 {
        self.max - self.min + 1
    }

    /// Number of records to skip: `min`.
    #[must_use]
    pub const fn skip(&self) -> i64 {
        self.min
    }
}

impl FromStr for EmailRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RANGE: OnceLock<Regex> = OnceLock::new();
        let pattern = RANGE.get_or_init(|| {
            Regex::new(r"^\s*(-?\d+)\s*-\s*(-?\d+)\s*$").expect("valid regex")
        });

        let caps = pattern.captures(s).ok_or(RangeError::Unparseable)?;
        let min: i64 = caps[1].parse().map_err(|_| RangeError::Unparseable)?;
        let max: i64 = caps[2].parse().map_err(|_| RangeError::Unparseable)?;

        if min < 0 || max < 0 {
            return Err(RangeError::NegativeOffset);
        }
        if min > max {
            return Err(RangeError::MinGreaterThanMax);
        }
        if max > MAX_END_OFFSET {
            return Err(RangeError::MaxTooLarge);
        }

        Ok(Self { min, max })
    }
}

/// Parameters of the `run_query` action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunQueryParams {
    /// Mailbox owner.
    pub email: String,
    /// Folder id or well-known name; whole mailbox when absent.
    #[serde(default)]
    pub folder: Option<String>,
    /// `min-max` offset window, inclusive.
    #[serde(default)]
    pub range: Option<String>,
    /// Substring the subject must contain.
    #[serde(default)]
    pub subject: Option<String>,
    /// Exact sender address.
    #[serde(default)]
    pub sender: Option<String>,
    /// Exact `internetMessageId`.
    #[serde(default)]
    pub internet_message_id: Option<String>,
    /// Raw OData query string; replaces every constructed parameter.
    #[serde(default)]
    pub query: Option<String>,
}

/// Endpoint and query parameters for a message listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Path relative to the Graph base, possibly carrying a raw query string.
    pub endpoint: String,
    /// Query parameters; `None` when a raw query string is in the endpoint.
    pub params: Option<Vec<(String, String)>>,
}

/// Build the listing call for `run_query`.
///
/// Filter literals are substituted between single quotes as given.
pub fn build_message_query(params: &RunQueryParams) -> Result<MessageQuery, RangeError> {
    let mut endpoint = format!("/users/{}", params.email);
    if let Some(folder) = &params.folder {
        endpoint.push_str(&format!("/mailFolders/{folder}"));
    }
    endpoint.push_str("/messages");

    let range: EmailRange = params.range.as_deref().unwrap_or(DEFAULT_RANGE).parse()?;

    if let Some(raw) = params.query.as_deref().filter(|q| !q.is_empty()) {
        endpoint.push('?');
        endpoint.push_str(raw);
        return Ok(MessageQuery {
            endpoint,
            params: None,
        });
    }

    let mut query = vec![
        ("$top".to_string(), range.top().to_string()),
        ("$skip".to_string(), range.skip().to_string()),
    ];

    let clauses: Vec<String> = [
        params
            .subject
            .as_ref()
            .map(|s| format!(" contains(subject, '{s}')")),
        params
            .sender
            .as_ref()
            .map(|s| format!(" (sender/emailAddress/address) eq '{s}'")),
        params
            .internet_message_id
            .as_ref()
            .map(|id| format!(" (internetMessageId) eq '{id}'")),
    ]
    .into_iter()
    .flatten()
    .collect();

    if !clauses.is_empty() {
        query.push(("$filter".to_string(), clauses.join(" and ")));
    }

    Ok(MessageQuery {
        endpoint,
        params: Some(query),
    })
}
