//! Best-effort persistence of tool invocations.
//!
//! The event row is written first; the trace row follows only if the event
//! insert succeeded and a payload is present. The two writes are not in one
//! transaction, so readers can observe an event whose trace has not landed.

use crate::activity::ActivityRepository;
use crate::error::RecordError;
use crate::store::{Store, StoreProvider};
use crate::types::{ActivityId, ActivityStatus, NewActivity, NewTrace, ServerId};
use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordInput {
    pub server_id: ServerId,
    pub agent_name: Option<String>,
    pub tool_name: String,
    pub status: ActivityStatus,
    pub latency_ms: Option<u64>,
    pub request_payload: Option<Value>,
    pub response_payload: Option<Value>,
}

impl RecordInput {
    pub fn new(server_id: ServerId, tool_name: impl Into<String>, status: ActivityStatus) -> Self {
        Self {
            server_id,
            agent_name: None,
            tool_name: tool_name.into(),
            status,
            latency_ms: None,
            request_payload: None,
            response_payload: None,
        }
    }

    pub fn agent(mut self, agent_name: Option<String>) -> Self {
        self.agent_name = agent_name;
        self
    }

    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn payloads(mut self, request: Option<Value>, response: Option<Value>) -> Self {
        self.request_payload = request;
        self.response_payload = response;
        self
    }
}

#[derive(Clone)]
pub struct Recorder<P> {
    provider: P,
}

impl<P: StoreProvider> Recorder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Persists one event and, when a payload is present, its trace.
    ///
    /// Failures are logged here and returned for inspection only; callers on
    /// the request path drop them.
    pub fn record(&self, input: RecordInput) -> Result<ActivityId, RecordError> {
        let result = self.try_record(input);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "activity recording failed");
        }
        result
    }

    fn try_record(&self, input: RecordInput) -> Result<ActivityId, RecordError> {
        let tool_name = input.tool_name.trim();
        if tool_name.is_empty() {
            return Err(RecordError::InvalidInput {
                message: "tool name must not be empty".to_string(),
            });
        }

        let store = self.provider.open().map_err(|err| RecordError::Store {
            message: err.to_string(),
        })?;
        let now = Utc::now();
        let event = store
            .activity()
            .insert_event(NewActivity {
                server_id: input.server_id,
                agent_name: input.agent_name,
                tool_name: tool_name.to_string(),
                status: input.status,
                latency_ms: input.latency_ms,
                created_at: now,
            })
            .map_err(|err| RecordError::Store {
                message: err.to_string(),
            })?;

        if has_payload(input.request_payload.as_ref())
            || has_payload(input.response_payload.as_ref())
        {
            let trace = NewTrace {
                activity_id: event.id.clone(),
                request_payload: input.request_payload,
                response_payload: input.response_payload,
                trace_id: advisory_trace_id(now),
                created_at: now,
            };
            // The event stands on its own; a lost trace is only logged.
            if let Err(err) = store.activity().insert_trace(trace) {
                tracing::warn!(
                    activity_id = %event.id,
                    error = %err,
                    "request trace write failed"
                );
            }
        }

        tracing::debug!(
            activity_id = %event.id,
            tool = %event.tool_name,
            status = %event.status,
            latency_ms = ?event.latency_ms,
            "activity recorded"
        );
        Ok(event.id)
    }
}

fn has_payload(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(text)) => !text.is_empty(),
        Some(_) => true,
    }
}

/// Human-readable trace tag. Not unique under sub-microsecond writes.
pub fn advisory_trace_id(at: DateTime<Utc>) -> String {
    format!("trace_{}.{:06}", at.timestamp(), at.timestamp_subsec_micros())
}
