//! `run_query`: list messages in a mailbox or folder.

use serde_json::Value;

use crate::actions::{ActionContext, ActionResult, Params};
use crate::client::{build_message_query, GraphRequest, RunQueryParams};
use crate::error::{ConnectorError, Result};

pub async fn handle(ctx: &ActionContext<'_>, params: &Params) -> Result<ActionResult> {
    ctx.progress
        .save_progress("In action handler for: run_query");

    let params: RunQueryParams = serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| ConnectorError::Validation(format!("Invalid parameters: {e}")))?;
    let query = build_message_query(&params)?;

    let response = ctx
        .client
        .call(GraphRequest::get(query.endpoint).params(query.params))
        .await
        .into_result()?;

    let mut result = ActionResult::success();
    if let Some(messages) = response.get("value").and_then(Value::as_array) {
        for message in messages {
            result.add_data(message.clone());
        }
    }
    result.update_summary("emails_matched", result.data.len());

    Ok(result)
}
