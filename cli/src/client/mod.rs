//! Microsoft Graph request facade.
//!
//! Every call goes through [`GraphClient::call`] and comes back as a
//! [`response::RestCallOutcome`]; transport faults and odd content types never escape
//! as anything else.

pub mod api;
pub mod middleware;
pub mod query;
pub mod response;

pub use api::{GraphClient, GraphRequest};
pub use query::{build_message_query, RunQueryParams};
