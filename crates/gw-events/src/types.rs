use crate::ids::{ActivityId, ServerId, TeamId, TraceRecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Error,
    Pending,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity status: {value}")]
pub struct StatusParseError {
    pub value: String,
}

impl FromStr for ActivityStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "pending" => Ok(Self::Pending),
            other => Err(StatusParseError {
                value: other.to_string(),
            }),
        }
    }
}

/// One recorded tool invocation. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActivityEvent {
    pub id: ActivityId,
    pub server_id: ServerId,
    pub agent_name: Option<String>,
    pub tool_name: String,
    pub status: ActivityStatus,
    pub latency_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// Request/response capture for one event.
///
/// `trace_id` is derived from the wall clock and is only a debugging aid;
/// two traces written in the same instant can share it. `id` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestTrace {
    pub id: TraceRecordId,
    pub activity_id: ActivityId,
    pub request_payload: Option<Value>,
    pub response_payload: Option<Value>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
}

/// An event joined with the scoping attributes of its owning server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub event: ActivityEvent,
    pub team_id: TeamId,
    pub server_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_outcomes() {
        assert_eq!("success".parse::<ActivityStatus>(), Ok(ActivityStatus::Success));
        assert_eq!("pending".parse::<ActivityStatus>(), Ok(ActivityStatus::Pending));
        let err = "Success".parse::<ActivityStatus>().unwrap_err();
        assert_eq!(err.value, "Success");
    }

    #[test]
    fn feed_entry_serializes_flat() {
        let entry = FeedEntry {
            event: ActivityEvent {
                id: ActivityId::generate(),
                server_id: ServerId::generate(),
                agent_name: None,
                tool_name: "post_message".to_string(),
                status: ActivityStatus::Error,
                latency_ms: Some(12),
                created_at: Utc::now(),
            },
            team_id: TeamId::generate(),
            server_name: "slack".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["tool_name"], "post_message");
        assert_eq!(json["status"], "error");
        assert_eq!(json["server_name"], "slack");
    }
}
