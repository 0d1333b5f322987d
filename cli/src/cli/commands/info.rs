//! Informational command handlers: `status`, `actions`, `completions`.

use chrono::Utc;

use crate::actions::ActionKind;
use crate::cli::args::ShellType;
use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::state::{AdminConsent, AssetState, StateStore};

/// Handles the `o365 status` command.
pub fn handle_status(config: &ConnectorConfig, store: &dyn StateStore) -> Result<()> {
    let state = store.load(&config.asset.id)?;
    println!("{}", render_status(&config.asset.id, &state));
    Ok(())
}

fn render_status(asset_id: &str, state: &AssetState) -> String {
    let consent = match state.admin_consent {
        Some(AdminConsent::Granted) => "granted",
        Some(AdminConsent::Denied) => "declined",
        None => "not recorded",
    };

    let token = match &state.token {
        None => "none".to_string(),
        Some(token) if token.is_expired() => "expired".to_string(),
        Some(token) => match token.expires_at {
            Some(at) => format!("valid for {} more minutes", (at - Utc::now()).num_minutes()),
            None => "valid".to_string(),
        },
    };

    let mut lines = vec![
        format!("Asset:         {asset_id}"),
        format!("Admin consent: {consent}"),
        format!("Token:         {token}"),
    ];
    if !state.consent_granted() {
        lines.push(String::new());
        lines.push("Run 'o365 action test_connectivity' to request admin consent.".to_string());
    }
    lines.join("\n")
}

/// Handles the `o365 actions` command.
pub fn handle_actions() {
    for kind in ActionKind::ALL {
        let note = if kind.requires_consent() {
            "  (requires admin consent)"
        } else {
            ""
        };
        println!("{kind}{note}");
    }
}

/// Handles the `o365 completions <shell>` command.
///
/// Generates shell completion scripts.
pub fn handle_completions(shell: ShellType) {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell};

    let mut cmd = crate::cli::Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
    };

    generate(shell, &mut cmd, "o365", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenBundle;

    #[test]
    fn fresh_state_points_at_test_connectivity() {
        let text = render_status("1", &AssetState::default());
        assert!(text.contains("Admin consent: not recorded"));
        assert!(text.contains("Token:         none"));
        assert!(text.contains("test_connectivity"));
    }

    #[test]
    fn granted_state_reports_token_lifetime() {
        let state = AssetState {
            admin_consent: Some(AdminConsent::Granted),
            token: Some(TokenBundle::new("tok", "Bearer", Some(3630))),
            ..AssetState::default()
        };
        let text = render_status("1", &state);
        assert!(text.contains("Admin consent: granted"));
        assert!(text.contains("valid for 60 more minutes"));
        assert!(!text.contains("test_connectivity"));
    }

    #[test]
    fn short_lived_token_is_reported_expired() {
        let state = AssetState {
            token: Some(TokenBundle::new("tok", "Bearer", Some(30))),
            ..AssetState::default()
        };
        assert!(render_status("1", &state).contains("Token:         expired"));
    }
}
