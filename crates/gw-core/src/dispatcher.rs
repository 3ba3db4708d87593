use crate::backend::BackendRegistry;
use crate::error::{DispatchError, GatewayError};
use crate::recorder::{RecordInput, Recorder};
use crate::servers::ServerRepository;
use crate::store::{Store, StoreProvider};
use crate::types::{ActivityStatus, ResponseEnvelope, Server, ServerKind, TeamId};
use serde_json::{Value, json};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub kind: ServerKind,
    pub tool_name: String,
    pub parameters: Value,
    pub agent_name: Option<String>,
}

/// Routes tool calls to backends and records one activity event per call.
#[derive(Clone)]
pub struct Dispatcher<P> {
    provider: P,
    backends: BackendRegistry,
    recorder: Recorder<P>,
}

impl<P: StoreProvider> Dispatcher<P> {
    pub fn new(provider: P, backends: BackendRegistry) -> Self {
        Self {
            recorder: Recorder::new(provider.clone()),
            provider,
            backends,
        }
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Executes `call` for `team_id`.
    ///
    /// `Ok` carries the success envelope. Errors are turned into the failure
    /// envelope by the caller via [`ResponseEnvelope::failure`].
    pub async fn dispatch(
        &self,
        team_id: &TeamId,
        call: ToolCall,
    ) -> Result<ResponseEnvelope, GatewayError> {
        let backend = self
            .backends
            .get(call.kind)
            .ok_or(DispatchError::NotConfigured { kind: call.kind })?;
        let server = self.resolve_server(team_id, call.kind)?;

        let started = Instant::now();
        let result = backend
            .call(&server, &call.tool_name, &call.parameters)
            .await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let record = RecordInput::new(server.id.clone(), call.tool_name.clone(), status_of(&result))
            .agent(call.agent_name)
            .latency(latency_ms);
        match result {
            Ok(data) => {
                let envelope = ResponseEnvelope::success(&call.tool_name, data);
                let response = serde_json::to_value(&envelope).ok();
                let _ = self
                    .recorder
                    .record(record.payloads(Some(call.parameters), response));
                Ok(envelope)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::info!(
                    server_id = %server.id,
                    tool = %call.tool_name,
                    latency_ms,
                    error = %message,
                    "backend call failed"
                );
                let _ = self.recorder.record(
                    record.payloads(Some(call.parameters), Some(json!({ "error": message }))),
                );
                Err(DispatchError::BackendFailure { message }.into())
            }
        }
    }

    fn resolve_server(&self, team_id: &TeamId, kind: ServerKind) -> Result<Server, GatewayError> {
        let store = self.provider.open()?;
        store
            .servers()
            .find_active(team_id, kind)?
            .ok_or_else(|| DispatchError::NotConfigured { kind }.into())
    }
}

fn status_of<T, E>(result: &Result<T, E>) -> ActivityStatus {
    if result.is_ok() {
        ActivityStatus::Success
    } else {
        ActivityStatus::Error
    }
}
