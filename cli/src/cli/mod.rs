//! CLI module for the connector.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
