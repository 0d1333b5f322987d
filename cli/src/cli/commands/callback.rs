//! `o365 callback` command handler.

use std::collections::HashMap;

use serde_json::json;

use crate::auth::{handle_request, HandlerResponse};
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::state::StateStore;

/// Handles `o365 callback <call_type>`.
///
/// Runs the redirect endpoint once for the configured asset name and prints
/// what it would have sent to the browser.
pub fn handle_callback(
    config: &ConnectorConfig,
    store: &dyn StateStore,
    call_type: &str,
    query: Vec<(String, String)>,
) -> Result<()> {
    let query: HashMap<String, String> = query.into_iter().collect();
    let response = handle_request(&[config.asset.name.as_str(), call_type], &query, store);
    println!("{}", render(&response));
    Ok(())
}

fn render(response: &HandlerResponse) -> String {
    match response {
        HandlerResponse::Text(text) => text.clone(),
        HandlerResponse::Redirect(location) => format!("302 Found\nLocation: {location}"),
        HandlerResponse::Error(message) => json!({ "error": true, "message": message }).to_string(),
    }
}
