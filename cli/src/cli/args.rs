//! Command-line argument parsing.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Office 365 mailbox connector.
///
/// Runs connector actions against Microsoft Graph and serves the admin
/// consent redirect endpoint.
#[derive(Parser, Debug)]
#[command(name = "o365")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, env = "O365_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for asset state and completion markers.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Asset identifier, overriding the configured one.
    #[arg(long, global = true)]
    pub asset_id: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one connector action and print its result as JSON.
    ///
    /// Exits non-zero when the action fails.
    Action {
        /// Action identifier (see `o365 actions`).
        identifier: String,

        /// Action parameter, repeatable.
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Skip opening the consent URL in the browser.
        #[arg(long)]
        no_browser: bool,
    },

    /// Handle one redirect endpoint call and print the response.
    ///
    /// For hosts that invoke the endpoint out of process.
    Callback {
        /// Call type: `start_oauth` or `result`.
        call_type: String,

        /// Query parameter, repeatable.
        #[arg(short = 'q', long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Serve the redirect endpoint over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Show consent and token status for the asset.
    Status,

    /// List the supported action identifiers.
    Actions,

    /// Generate shell completion scripts.
    ///
    /// Outputs completion script for the specified shell.
    /// Follow shell-specific instructions to install.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Supported shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}
