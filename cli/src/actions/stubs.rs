//! Declared actions without an implementation.

use crate::actions::{ActionContext, ActionKind, ActionResult};
use crate::error::{ConnectorError, Result};

pub fn handle(ctx: &ActionContext<'_>, kind: ActionKind) -> Result<ActionResult> {
    ctx.progress
        .save_progress(&format!("In action handler for: {kind}"));
    Err(ConnectorError::NotImplemented(kind.identifier().to_string()))
}
