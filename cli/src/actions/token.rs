//! `generate_token`: obtain a token without going through the consent prompt.

use crate::actions::{ActionContext, ActionResult};
use crate::auth::exchange_client_credentials;
use crate::error::Result;
use crate::state::{AdminConsent, AssetState};

/// Exchange the credentials and record consent as granted.
///
/// For tenants where consent was given outside the connector.
pub async fn handle(ctx: &ActionContext<'_>, state: &mut AssetState) -> Result<ActionResult> {
    let token = exchange_client_credentials(ctx.config).await?;
    state.token = Some(token);
    state.admin_consent = Some(AdminConsent::Granted);

    Ok(ActionResult::with_message("Token generated"))
}
