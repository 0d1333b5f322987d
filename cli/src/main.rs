//! O365 Connector - Office 365 mailbox actions over Microsoft Graph
//!
//! Obtains tenant-wide admin consent through a browser redirect handshake,
//! exchanges application credentials for tokens, and queries mailboxes.

mod actions;
mod auth;
mod cli;
mod client;
mod config;
mod error;
mod server;
mod state;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::settings::env;
use crate::error::Result;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run the command
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Run the selected command; `Ok(false)` means it completed but failed.
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Actions => {
            cli::commands::handle_actions();
            return Ok(true);
        }
        Commands::Completions { shell } => {
            cli::commands::handle_completions(shell);
            return Ok(true);
        }
        _ => {}
    }

    let config = cli::commands::load_settings(&cli)?;
    let store = cli::commands::open_store(&config)?;

    match cli.command {
        Commands::Action {
            identifier,
            params,
            no_browser,
        } => cli::commands::handle_action(&config, &store, &identifier, params, no_browser).await,
        Commands::Callback { call_type, query } => {
            cli::commands::handle_callback(&config, &store, &call_type, query).map(|()| true)
        }
        Commands::Serve { bind } => cli::commands::handle_serve(store, bind).await.map(|()| true),
        Commands::Status => cli::commands::handle_status(&config, &store).map(|()| true),
        Commands::Actions | Commands::Completions { .. } => Ok(true),
    }
}
