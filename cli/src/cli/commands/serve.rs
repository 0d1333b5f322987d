//! `o365 serve` command handler.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::Result;
use crate::server;
use crate::state::FileStateStore;

/// Handles `o365 serve`.
pub async fn handle_serve(store: FileStateStore, bind: SocketAddr) -> Result<()> {
    println!("Serving redirect endpoint on http://{bind}/rest/handler/");
    println!("Press Ctrl-C to stop.");
    server::serve(bind, Arc::new(store)).await
}
