//! Connector actions.
//!
//! Every action runs inside the same lifecycle:
//! 1. load the asset state
//! 2. check preconditions (consent, fresh token) for actions that call Graph
//! 3. run the handler
//! 4. save the asset state, whatever the outcome
//!
//! Errors never escape [`ActionContext::run`]; they become failed results.

pub mod connectivity;
pub mod progress;
pub mod query;
pub mod result;
pub mod stubs;
pub mod token;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::auth::{exchange_client_credentials, Sleeper};
use crate::client::GraphClient;
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, Result};
use crate::state::{AssetState, StateStore};

pub use progress::{ConsoleProgress, ProgressSink};
pub use result::ActionResult;

/// Action parameters, keyed by parameter name.
pub type Params = Map<String, Value>;

/// Actions the connector supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    TestConnectivity,
    GenerateToken,
    RunQuery,
    CopyEmail,
    DeleteEmail,
    GetEmail,
    OnPoll,
}

impl ActionKind {
    pub const ALL: [Self; 7] = [
        Self::TestConnectivity,
        Self::GenerateToken,
        Self::RunQuery,
        Self::CopyEmail,
        Self::DeleteEmail,
        Self::GetEmail,
        Self::OnPoll,
    ];

    /// Identifier the host uses to invoke the action.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::TestConnectivity => "test_connectivity",
            Self::GenerateToken => "generate_token",
            Self::RunQuery => "run_query",
            Self::CopyEmail => "copy_email",
            Self::DeleteEmail => "delete_email",
            Self::GetEmail => "get_email",
            Self::OnPoll => "on_poll",
        }
    }

    /// Whether the action needs granted consent and a fresh token first.
    #[must_use]
    pub const fn requires_consent(self) -> bool {
        matches!(self, Self::RunQuery)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for ActionKind {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.identifier() == s)
            .ok_or_else(|| ConnectorError::Validation(format!("Unsupported action: {s}")))
    }
}

/// Collaborators an action runs against.
pub struct ActionContext<'a> {
    pub config: &'a ConnectorConfig,
    pub store: &'a dyn StateStore,
    pub progress: &'a dyn ProgressSink,
    pub sleeper: &'a dyn Sleeper,
    pub client: &'a GraphClient,
    /// Open the consent URL in the default browser during test connectivity.
    pub open_browser: bool,
}

impl ActionContext<'_> {
    /// Run one action through the full lifecycle.
    pub async fn run(&self, kind: ActionKind, params: &Params) -> ActionResult {
        let asset_id = self.config.asset.id.as_str();
        info!(action = %kind, asset_id, "Running action");

        let mut state = match self.store.load(asset_id) {
            Ok(state) => state,
            Err(e) => return self.report(kind, Err(e)),
        };

        let mut outcome = match self.prepare(kind, &mut state).await {
            Ok(()) => self.dispatch(kind, params, &mut state).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self.store.save(asset_id, &state) {
            warn!(asset_id, error = %e, "Failed to save asset state");
            if outcome.is_ok() {
                outcome = Err(e);
            }
        }

        self.report(kind, outcome)
    }

    async fn prepare(&self, kind: ActionKind, state: &mut AssetState) -> Result<()> {
        if !kind.requires_consent() {
            return Ok(());
        }
        if !state.consent_granted() {
            return Err(ConnectorError::ConsentRequired);
        }

        let token = exchange_client_credentials(self.config).await?;
        self.client.set_token(&token).await;
        state.token = Some(token);
        Ok(())
    }

    async fn dispatch(
        &self,
        kind: ActionKind,
        params: &Params,
        state: &mut AssetState,
    ) -> Result<ActionResult> {
        match kind {
            ActionKind::TestConnectivity => connectivity::handle(self, state).await,
            ActionKind::GenerateToken => token::handle(self, state).await,
            ActionKind::RunQuery => query::handle(self, params).await,
            ActionKind::CopyEmail
            | ActionKind::DeleteEmail
            | ActionKind::GetEmail
            | ActionKind::OnPoll => stubs::handle(self, kind),
        }
    }

    fn report(&self, kind: ActionKind, outcome: Result<ActionResult>) -> ActionResult {
        match outcome {
            Ok(result) => {
                info!(action = %kind, records = result.data.len(), "Action succeeded");
                result
            }
            Err(e) => {
                if e.is_consent_failure() {
                    warn!(action = %kind, error = %e, "Action stopped on admin consent");
                } else {
                    error!(action = %kind, error = %e, "Action failed");
                }
                ActionResult::failed(&e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use tempfile::TempDir;
    use url::Url;
    use wiremock::MockServer;

    use super::*;
    use crate::actions::progress::testing::RecordingProgress;
    use crate::auth::poll::testing::RecordingSleeper;
    use crate::state::FileStateStore;

    /// Config, store and recorders wired to a mock Graph and login server.
    pub struct Fixture {
        _dir: TempDir,
        pub store: Arc<FileStateStore>,
        pub config: ConnectorConfig,
        pub progress: RecordingProgress,
        pub sleeper: RecordingSleeper,
        pub client: GraphClient,
    }

    impl Fixture {
        pub fn new(server: &MockServer) -> Self {
            let dir = TempDir::new().unwrap();
            let store = Arc::new(FileStateStore::new(dir.path().to_path_buf()).unwrap());

            let mut config = ConnectorConfig::default();
            config.asset.client_id = "client-abc".to_string();
            config.asset.client_secret = "s3cret".to_string();
            config.asset.tenant = "contoso".to_string();
            config.graph.login_base_url = Url::parse(&server.uri()).unwrap();
            config.graph.api_base_url = Url::parse(&format!("{}/v1.0", server.uri())).unwrap();
            let client = GraphClient::new(&config.graph).unwrap();

            Self {
                _dir: dir,
                store,
                config,
                progress: RecordingProgress::default(),
                sleeper: RecordingSleeper::default(),
                client,
            }
        }

        pub fn ctx(&self) -> ActionContext<'_> {
            self.ctx_with(&self.sleeper)
        }

        pub fn ctx_with<'a>(&'a self, sleeper: &'a dyn Sleeper) -> ActionContext<'a> {
            ActionContext {
                config: &self.config,
                store: self.store.as_ref(),
                progress: &self.progress,
                sleeper,
                client: &self.client,
                open_browser: false,
            }
        }

        pub fn grant_consent(&self) {
            let state = AssetState {
                admin_consent: Some(crate::state::AdminConsent::Granted),
                ..AssetState::default()
            };
            self.store.save(&self.config.asset.id, &state).unwrap();
        }
    }

    pub async fn mount_token_endpoint(server: &MockServer, access_token: &str) {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        Mock::given(method("POST"))
            .and(path("/contoso/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": access_token
            })))
            .mount(server)
            .await;
    }
}
