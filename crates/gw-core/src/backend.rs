use crate::types::{Server, ServerKind};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unknown tool: {tool}")]
    UnknownTool { tool: String },
    #[error("invalid parameters: {message}")]
    InvalidParams { message: String },
    #[error("server config missing {key}")]
    MissingConfig { key: &'static str },
    #[error("invalid server config: {message}")]
    InvalidConfig { message: String },
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend rejected call: {message}")]
    Rejected { message: String },
}

/// One third-party integration. Results are passed through untouched.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> ServerKind;

    async fn call(&self, server: &Server, tool: &str, params: &Value)
    -> Result<Value, BackendError>;
}

#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<ServerKind, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `backend` under its own kind, replacing any previous one.
    pub fn register(&mut self, backend: Arc<dyn Backend>) -> &mut Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    pub fn with(mut self, backend: Arc<dyn Backend>) -> Self {
        self.register(backend);
        self
    }

    pub fn get(&self, kind: ServerKind) -> Option<Arc<dyn Backend>> {
        self.backends.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ServerKind> {
        let mut kinds: Vec<ServerKind> = self.backends.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }
}

/// Reads a required string parameter.
pub fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, BackendError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| BackendError::InvalidParams {
            message: format!("missing string parameter `{key}`"),
        })
}

pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}
