//! Authentication module for the connector.
//!
//! This module provides the tenant admin consent handshake, the redirect
//! endpoint it relies on, and the client-credentials token exchange.

pub mod callback;
pub mod consent;
pub mod endpoints;
pub mod poll;
pub mod token;
pub mod tokens;

pub use callback::{handle_request, HandlerResponse};
pub use consent::ConsentCoordinator;
pub use poll::{Sleeper, TokioSleeper};
pub use token::exchange_client_credentials;
pub use tokens::TokenBundle;
