//! HTTP front end for the redirect endpoint.
//!
//! Serves the same call types the host platform would route to the app:
//! `GET /rest/handler/{app}/{asset}/{call_type}`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::auth::{handle_request, HandlerResponse};
use crate::error::Result;
use crate::state::StateStore;

type SharedStore = Arc<dyn StateStore>;

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Text(text) => (StatusCode::OK, text).into_response(),
            Self::Redirect(location) => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            Self::Error(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": true, "message": message })),
            )
                .into_response(),
        }
    }
}

/// Build the redirect endpoint router.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/rest/handler/{app}/{asset}", get(asset_only))
        .route("/rest/handler/{app}/{asset}/{call_type}", get(call))
        .with_state(store)
}

async fn call(
    Path((app, asset, call_type)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    State(store): State<SharedStore>,
) -> HandlerResponse {
    debug!(app, asset, call_type, "Redirect endpoint call");
    handle_request(&[asset.as_str(), call_type.as_str()], &query, store.as_ref())
}

async fn asset_only(
    Path((_app, asset)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    State(store): State<SharedStore>,
) -> HandlerResponse {
    handle_request(&[asset.as_str()], &query, store.as_ref())
}

/// Serve the redirect endpoint until Ctrl-C.
pub async fn serve(addr: SocketAddr, store: SharedStore) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Redirect endpoint listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
