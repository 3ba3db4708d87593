use crate::types::enums::ServerKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("team not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("api key not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("unauthorized")]
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no {kind} server configured for team")]
    NotConfigured { kind: ServerKind },
    #[error("backend call failed: {message}")]
    BackendFailure { message: String },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

/// Failure to persist an activity event. Logged by the recorder and never
/// surfaced to the caller of a dispatch.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store write failed: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Team(#[from] TeamError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}
