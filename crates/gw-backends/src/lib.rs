//! HTTP backends for the gateway's three server kinds.

pub mod chat;
pub mod http;
pub mod store;
pub mod workflow;

use gw_core::backend::{BackendError, BackendRegistry};
use std::sync::Arc;
use std::time::Duration;

pub use crate::chat::ChatBackend;
pub use crate::store::StoreBackend;
pub use crate::workflow::WorkflowBackend;

/// Registry with every built-in backend sharing one HTTP client.
pub fn default_registry(timeout: Duration) -> Result<BackendRegistry, BackendError> {
    let client = http::build_client(timeout)?;
    Ok(BackendRegistry::new()
        .with(Arc::new(ChatBackend::new(client.clone())))
        .with(Arc::new(WorkflowBackend::new(client.clone())))
        .with(Arc::new(StoreBackend::new(client))))
}
