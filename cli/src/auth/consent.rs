//! Admin consent coordinator.
//!
//! Drives one test connectivity handshake through its phases:
//!
//! ```text
//! Idle -> AwaitingCallback -> ConsentGranted -> TokenIssued -> Verified
//!   \___________\_________________\________________\________-> Failed
//! ```
//!
//! The redirect endpoint runs independently and talks back only through the
//! [`StateStore`]: it records the consent answer and then drops a completion
//! marker, which [`ConsentCoordinator::await_callback`] polls for.

use tracing::{debug, info, warn};

use crate::actions::ProgressSink;
use crate::auth::endpoints::{admin_consent_url, app_rest_url, operator_start_url, redirect_uri};
use crate::auth::poll::{poll_bounded, PollPolicy, Sleeper};
use crate::auth::token::exchange_client_credentials;
use crate::auth::tokens::TokenBundle;
use crate::client::{GraphClient, GraphRequest};
use crate::config::{ConnectorConfig, ConsentConfig};
use crate::error::{ConnectorError, Result};
use crate::state::{AssetState, StateStore};

/// Phase of a consent handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentPhase {
    Idle,
    AwaitingCallback,
    ConsentGranted,
    TokenIssued,
    Verified,
    Failed,
}

impl ConsentPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCallback => "awaiting_callback",
            Self::ConsentGranted => "consent_granted",
            Self::TokenIssued => "token_issued",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }
}

/// URLs published when a handshake starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentStart {
    /// Callback URL registered with the identity provider.
    pub redirect_uri: String,
    /// Tenant admin consent prompt.
    pub admin_consent_url: String,
    /// Operator-facing URL that redirects to the consent prompt.
    pub operator_url: String,
}

impl From<&ConsentConfig> for PollPolicy {
    fn from(config: &ConsentConfig) -> Self {
        Self {
            attempts: config.poll_attempts,
            interval: config.poll_interval(),
        }
    }
}

/// Coordinates one admin consent handshake for the configured asset.
pub struct ConsentCoordinator<'a> {
    config: &'a ConnectorConfig,
    store: &'a dyn StateStore,
    progress: &'a dyn ProgressSink,
    sleeper: &'a dyn Sleeper,
    phase: ConsentPhase,
}

impl<'a> ConsentCoordinator<'a> {
    #[must_use]
    pub fn new(
        config: &'a ConnectorConfig,
        store: &'a dyn StateStore,
        progress: &'a dyn ProgressSink,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            store,
            progress,
            sleeper,
            phase: ConsentPhase::Idle,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ConsentPhase {
        self.phase
    }

    /// Build and persist the consent URLs, discarding any earlier result.
    ///
    /// # Errors
    ///
    /// Fails if the URLs cannot be built or the pending state cannot be saved.
    pub fn start_consent(&mut self) -> Result<(AssetState, ConsentStart)> {
        self.expect_phase(ConsentPhase::Idle)?;
        let result = self.publish_urls();
        self.advance(result, ConsentPhase::AwaitingCallback)
    }

    fn publish_urls(&self) -> Result<(AssetState, ConsentStart)> {
        let asset = &self.config.asset;

        self.progress.save_progress("Getting App REST endpoint URL");
        let rest_url = app_rest_url(self.config);

        let redirect = redirect_uri(&rest_url);
        self.progress.save_progress("Using OAuth Redirect URL as:");
        self.progress.save_progress(&redirect);

        let consent_url = admin_consent_url(
            &self.config.graph,
            &asset.tenant,
            &asset.client_id,
            &redirect,
            &asset.id,
        )?
        .to_string();

        let state = AssetState::pending_consent(redirect.clone(), consent_url.clone());
        self.store.save(&asset.id, &state)?;
        // A marker left over from an abandoned attempt would end the wait early.
        if self.store.take_completion(&asset.id)? {
            debug!(asset_id = %asset.id, "Removed stale completion marker");
        }

        let operator_url = operator_start_url(&rest_url, &asset.id);
        self.progress.save_progress(&format!(
            "Please connect to the following URL from a different tab to continue the connectivity process\n{operator_url}"
        ));

        Ok((
            state,
            ConsentStart {
                redirect_uri: redirect,
                admin_consent_url: consent_url,
                operator_url,
            },
        ))
    }

    /// Wait for the redirect endpoint to report, then return the state it
    /// recorded.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::ConsentTimeout`] when no marker appears within the
    /// polling budget, [`ConnectorError::ConsentDenied`] when the recorded
    /// answer is anything but granted.
    pub async fn await_callback(&mut self) -> Result<AssetState> {
        self.expect_phase(ConsentPhase::AwaitingCallback)?;
        let result = self.wait_for_marker().await;
        self.advance(result, ConsentPhase::ConsentGranted)
    }

    async fn wait_for_marker(&self) -> Result<AssetState> {
        let consent = &self.config.consent;
        let asset_id = self.config.asset.id.as_str();
        let policy = PollPolicy::from(consent);

        self.progress.save_progress("Waiting for Admin Consent to complete");
        self.sleeper.sleep(consent.initial_delay()).await;

        let found = poll_bounded(
            &policy,
            self.sleeper,
            |attempt| {
                let dots = (attempt % 10) as usize;
                self.progress.send_progress(&".".repeat(dots));
            },
            |_| Ok(self.store.take_completion(asset_id)?.then_some(())),
        )
        .await?;
        self.progress.send_progress("");

        if found.is_none() {
            warn!(asset_id, attempts = policy.attempts, "Admin consent wait timed out");
            return Err(ConnectorError::ConsentTimeout {
                attempts: policy.attempts,
            });
        }

        let state = self.store.load(asset_id)?;
        if !state.consent_granted() {
            return Err(ConnectorError::ConsentDenied(
                "The consent prompt was declined or returned an error.".to_string(),
            ));
        }

        info!(asset_id, "Admin consent granted");
        Ok(state)
    }

    /// Obtain an access token and store it in `state`.
    ///
    /// # Errors
    ///
    /// Propagates [`ConnectorError::TokenExchange`] from the identity provider.
    pub async fn exchange_token(&mut self, state: &mut AssetState) -> Result<()> {
        self.expect_phase(ConsentPhase::ConsentGranted)?;
        self.progress.save_progress("Getting the token");

        let result = exchange_client_credentials(self.config)
            .await
            .map(|token| state.token = Some(token));
        self.advance(result, ConsentPhase::TokenIssued)
    }

    /// Confirm `token` works by listing a single user.
    ///
    /// Returns the number of users the call returned.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::TokenVerification`] wrapping the call failure.
    pub async fn verify_token(&mut self, client: &GraphClient, token: &TokenBundle) -> Result<usize> {
        self.expect_phase(ConsentPhase::TokenIssued)?;
        self.progress
            .save_progress("Getting info about a single user to verify token");

        client.set_token(token).await;
        let request =
            GraphRequest::get("/users").params(Some(vec![("$top".to_string(), "1".to_string())]));

        let result = client
            .call(request)
            .await
            .into_result()
            .map(|body| body["value"].as_array().map_or(0, Vec::len))
            .map_err(|e| ConnectorError::TokenVerification(e.to_string()));

        if matches!(result, Ok(n) if n > 0) {
            self.progress.save_progress("Got user info");
        }
        self.advance(result, ConsentPhase::Verified)
    }

    fn expect_phase(&self, expected: ConsentPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ConnectorError::InvalidPhase {
                expected: expected.as_str(),
                actual: self.phase.as_str(),
            })
        }
    }

    fn advance<T>(&mut self, result: Result<T>, next: ConsentPhase) -> Result<T> {
        self.phase = if result.is_ok() {
            next
        } else {
            ConsentPhase::Failed
        };
        debug!(phase = self.phase.as_str(), "Consent phase changed");
        result
    }
}
