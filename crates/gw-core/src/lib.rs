pub mod activity;
pub mod api_keys;
pub mod auth;
pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod recorder;
pub mod servers;
pub mod store;
pub mod teams;

pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::error::GatewayError;
pub use crate::gateway::Gateway;
pub use crate::store::{Store, StoreProvider};
