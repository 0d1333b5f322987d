//! Action result reported back to the caller.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ConnectorError;

/// Overall outcome of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Failed,
}

/// Status, message, data records and summary of one action run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub data: Vec<Value>,
    pub summary: Map<String, Value>,
}

impl ActionResult {
    /// Successful result without a message.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: ActionStatus::Success,
            message: String::new(),
            data: Vec::new(),
            summary: Map::new(),
        }
    }

    /// Successful result carrying `message`.
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::success()
        }
    }

    /// Failed result; the message is the error's display text.
    #[must_use]
    pub fn failed(err: &ConnectorError) -> Self {
        Self {
            status: ActionStatus::Failed,
            message: err.to_string(),
            ..Self::success()
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }

    pub fn add_data(&mut self, record: Value) {
        self.data.push(record);
    }

    pub fn update_summary(&mut self, key: &str, value: impl Into<Value>) {
        self.summary.insert(key.to_string(), value.into());
    }
}
