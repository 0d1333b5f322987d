//! Redirect endpoint handler for the admin consent handshake.
//!
//! Two calls arrive here from the operator's browser:
//! - `start_oauth?asset_id=..` bounces to the stored admin consent URL
//! - `result?state=..&admin_consent=..` records the outcome and wakes the
//!   waiting test connectivity action through the completion marker

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

use crate::error::{ConnectorError, Result};
use crate::state::{AdminConsent, StateStore};

const CONSENT_GRANTED: &str =
    "Admin Consent received. Please close this window, the action will continue to get new token";
const CONSENT_DECLINED: &str =
    "Admin Consent declined. Please close this window and try again later";

/// What the REST endpoint should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Plain text page.
    Text(String),
    /// HTTP 302 to the given location.
    Redirect(String),
    /// Structured error for malformed calls.
    Error(String),
}

/// Dispatch one REST call. `parts` are the path segments after the handler
/// prefix: the asset name followed by the call type.
pub fn handle_request(
    parts: &[&str],
    query: &HashMap<String, String>,
    store: &dyn StateStore,
) -> HandlerResponse {
    if parts.len() < 2 {
        return HandlerResponse::Error("Invalid REST endpoint request".to_string());
    }

    match parts[1] {
        "start_oauth" => handle_start(query, store),
        "result" => handle_result(query, store),
        _ => HandlerResponse::Error("Invalid endpoint".to_string()),
    }
}

fn handle_start(query: &HashMap<String, String>, store: &dyn StateStore) -> HandlerResponse {
    let Some(asset_id) = non_empty(query, "asset_id") else {
        return HandlerResponse::Text(ConnectorError::MissingAssetId.to_string());
    };

    let state = match store.load(asset_id) {
        Ok(state) => state,
        Err(e) => return HandlerResponse::Text(format!("ERROR: {e}")),
    };

    match state.admin_consent_url {
        Some(url) if !url.is_empty() => HandlerResponse::Redirect(url),
        _ => HandlerResponse::Text("App state is invalid, admin_consent_url key not found".to_string()),
    }
}

fn handle_result(query: &HashMap<String, String>, store: &dyn StateStore) -> HandlerResponse {
    let page = match record_consent(query, store) {
        Ok(text) => text,
        Err(e @ (ConnectorError::MissingAssetId | ConnectorError::ConsentMissingField(_))) => {
            format!("{e}\n{}", dump_query(query))
        }
        Err(e) => format!("ERROR: {e}"),
    };

    // The waiting action reloads state after this, so write the marker
    // last, even when nothing was recorded.
    if let Some(asset_id) = non_empty(query, "state") {
        if let Err(e) = store.mark_complete(asset_id) {
            warn!(asset_id, error = %e, "Failed to write consent completion marker");
        }
    }

    HandlerResponse::Text(page)
}

fn record_consent(query: &HashMap<String, String>, store: &dyn StateStore) -> Result<String> {
    let asset_id = non_empty(query, "state").ok_or(ConnectorError::MissingAssetId)?;

    if let Some(error) = non_empty(query, "error") {
        let mut message = format!("Error: {error}");
        if let Some(details) = non_empty(query, "error_description") {
            message.push_str(&format!(" Details: {details}"));
        }
        warn!(asset_id, error, "Identity provider returned an error on consent");
        return Ok(format!("Server returned {message}"));
    }

    let answer = non_empty(query, "admin_consent")
        .ok_or_else(|| ConnectorError::ConsentMissingField("admin_consent".to_string()))?;

    // Only the exact literal the identity provider sends counts as consent.
    let consent = AdminConsent::from(answer == "True");

    let mut state = store.load(asset_id)?;
    state.admin_consent = Some(consent);
    store.save(asset_id, &state)?;
    info!(asset_id, ?consent, "Recorded admin consent result");

    Ok(match consent {
        AdminConsent::Granted => CONSENT_GRANTED.to_string(),
        AdminConsent::Denied => CONSENT_DECLINED.to_string(),
    })
}

fn non_empty<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    query.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn dump_query(query: &HashMap<String, String>) -> String {
    let sorted: BTreeMap<&String, &String> = query.iter().collect();
    serde_json::to_string(&sorted).unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AssetState, FileStateStore, MockStateStore};
    use tempfile::TempDir;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn text(response: HandlerResponse) -> String {
        match response {
            HandlerResponse::Text(text) => text,
            other => panic!("expected text response, got {other:?}"),
        }
    }

    #[test]
    fn short_path_is_invalid_request() {
        let store = MockStateStore::new();
        assert_eq!(
            handle_request(&["only"], &HashMap::new(), &store),
            HandlerResponse::Error("Invalid REST endpoint request".to_string())
        );
    }

    #[test]
    fn unknown_call_type_is_invalid_endpoint() {
        let store = MockStateStore::new();
        assert_eq!(
            handle_request(&["prod", "refresh_token"], &HashMap::new(), &store),
            HandlerResponse::Error("Invalid endpoint".to_string())
        );
    }

    #[test]
    fn start_redirects_to_stored_consent_url() {
        let mut store = MockStateStore::new();
        store.expect_load().withf(|id| id == "7").returning(|_| {
            Ok(AssetState::pending_consent(
                "https://host/result".into(),
                "https://login.example/t/adminconsent?state=7".into(),
            ))
        });

        let response = handle_request(&["prod", "start_oauth"], &query(&[("asset_id", "7")]), &store);
        assert_eq!(
            response,
            HandlerResponse::Redirect("https://login.example/t/adminconsent?state=7".to_string())
        );
    }

    #[test]
    fn start_without_asset_id_or_url_explains() {
        let mut store = MockStateStore::new();
        store.expect_load().returning(|_| Ok(AssetState::default()));

        let missing_id = text(handle_request(&["prod", "start_oauth"], &HashMap::new(), &store));
        assert_eq!(missing_id, "ERROR: Asset ID not found in URL");

        let missing_url = text(handle_request(
            &["prod", "start_oauth"],
            &query(&[("asset_id", "7")]),
            &store,
        ));
        assert_eq!(missing_url, "App state is invalid, admin_consent_url key not found");
    }

    #[test]
    fn granted_result_records_consent_and_marks_complete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path().to_path_buf()).unwrap();
        store
            .save("13", &AssetState::pending_consent("r".into(), "u".into()))
            .unwrap();

        let page = text(handle_request(
            &["prod", "result"],
            &query(&[("admin_consent", "True"), ("tenant", "a417"), ("state", "13")]),
            &store,
        ));

        assert!(page.starts_with("Admin Consent received"));
        let state = store.load("13").unwrap();
        assert!(state.consent_granted());
        assert_eq!(state.admin_consent_url.as_deref(), Some("u"));
        assert!(store.take_completion("13").unwrap());
    }

    #[test]
    fn anything_but_exact_true_is_declined() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path().to_path_buf()).unwrap();

        for answer in ["False", "true", "yes"] {
            let page = text(handle_request(
                &["prod", "result"],
                &query(&[("admin_consent", answer), ("state", "13")]),
                &store,
            ));
            assert!(page.starts_with("Admin Consent declined"), "answer {answer}");
            assert_eq!(store.load("13").unwrap().admin_consent, Some(AdminConsent::Denied));
            assert!(store.take_completion("13").unwrap());
        }
    }

    #[test]
    fn provider_error_is_reported_without_touching_state() {
        let mut store = MockStateStore::new();
        store.expect_save().never();
        store
            .expect_mark_complete()
            .withf(|id| id == "13")
            .times(1)
            .returning(|_| Ok(()));

        let page = text(handle_request(
            &["prod", "result"],
            &query(&[
                ("state", "13"),
                ("error", "access_denied"),
                ("error_description", "AADSTS65004: User declined to consent"),
            ]),
            &store,
        ));

        assert_eq!(
            page,
            "Server returned Error: access_denied Details: AADSTS65004: User declined to consent"
        );
    }

    #[test]
    fn missing_admin_consent_still_wakes_the_poller() {
        let mut store = MockStateStore::new();
        store.expect_save().never();
        store
            .expect_mark_complete()
            .withf(|id| id == "13")
            .times(1)
            .returning(|_| Ok(()));

        let page = text(handle_request(&["prod", "result"], &query(&[("state", "13")]), &store));
        assert!(page.starts_with("ERROR: admin_consent not found in URL\n"));
        assert!(page.contains("\"state\":\"13\""));
    }

    #[test]
    fn missing_state_writes_no_marker() {
        let mut store = MockStateStore::new();
        store.expect_mark_complete().never();

        let page = text(handle_request(
            &["prod", "result"],
            &query(&[("admin_consent", "True")]),
            &store,
        ));
        assert!(page.starts_with("ERROR: Asset ID not found in URL"));
    }
}
