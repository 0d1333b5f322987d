//! `test_connectivity`: admin consent handshake, token, and a test call.

use crate::actions::{ActionContext, ActionResult};
use crate::auth::ConsentCoordinator;
use crate::error::{ConnectorError, Result};
use crate::state::AssetState;

pub async fn handle(ctx: &ActionContext<'_>, state: &mut AssetState) -> Result<ActionResult> {
    let outcome = run_handshake(ctx, state).await;
    match &outcome {
        Ok(_) => ctx.progress.save_progress("Test Connectivity Passed"),
        Err(e) => {
            ctx.progress.save_progress(&e.to_string());
            ctx.progress.save_progress("Test Connectivity Failed");
        }
    }
    outcome
}

async fn run_handshake(ctx: &ActionContext<'_>, state: &mut AssetState) -> Result<ActionResult> {
    let mut coordinator = ConsentCoordinator::new(ctx.config, ctx.store, ctx.progress, ctx.sleeper);

    let (pending, start) = coordinator.start_consent()?;
    *state = pending;

    if ctx.open_browser {
        if open::that(&start.operator_url).is_ok() {
            ctx.progress.save_progress("Browser opened automatically.");
        } else {
            ctx.progress
                .save_progress("Could not open browser. Please visit the URL manually.");
        }
    }

    match coordinator.await_callback().await {
        Ok(granted) => *state = granted,
        Err(e) => {
            // Keep whatever the redirect endpoint recorded.
            if matches!(e, ConnectorError::ConsentDenied(_)) {
                *state = ctx.store.load(&ctx.config.asset.id)?;
            }
            return Err(e);
        }
    }

    coordinator.exchange_token(state).await?;
    let Some(token) = state.token.clone() else {
        return Err(ConnectorError::TokenExchange(
            "no token stored after exchange".to_string(),
        ));
    };
    coordinator.verify_token(ctx.client, &token).await?;

    Ok(ActionResult::with_message("Test Connectivity Passed"))
}
