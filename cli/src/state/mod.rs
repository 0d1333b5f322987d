//! Per-asset persisted state and the cross-process completion channel.
//!
//! The polling side of the consent handshake and the redirect handler run in
//! unrelated invocations. They only ever talk through a [`StateStore`]: the
//! asset state document and a completion marker, both keyed by asset id.

pub mod store;
pub mod types;

pub use store::{FileStateStore, StateStore};
pub use types::{AdminConsent, AssetState};

#[cfg(test)]
pub use store::MockStateStore;
