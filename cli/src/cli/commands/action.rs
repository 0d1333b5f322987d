//! `o365 action` command handler.

use serde_json::Value;

use crate::actions::{ActionContext, ActionKind, ActionResult, ConsoleProgress, Params};
use crate::auth::TokioSleeper;
use crate::client::GraphClient;
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::state::StateStore;

/// Handles `o365 action <identifier>`.
///
/// Prints the action result as JSON and returns whether it succeeded.
///
/// # Errors
///
/// Returns an error only for an unknown identifier or an unusable HTTP
/// client; action failures are reported in the printed result.
pub async fn handle_action(
    config: &ConnectorConfig,
    store: &dyn StateStore,
    identifier: &str,
    params: Vec<(String, String)>,
    no_browser: bool,
) -> Result<bool> {
    let kind: ActionKind = identifier.parse()?;
    let client = GraphClient::new(&config.graph)?;

    let ctx = ActionContext {
        config,
        store,
        progress: &ConsoleProgress,
        sleeper: &TokioSleeper,
        client: &client,
        open_browser: !no_browser,
    };
    let result = ctx.run(kind, &to_params(params)).await;

    print_result(&result)?;
    Ok(result.is_success())
}

fn to_params(pairs: Vec<(String, String)>) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

fn print_result(result: &ActionResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
