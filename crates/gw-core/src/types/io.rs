use crate::types::enums::{ServerKind, TeamPlan};
use crate::types::{ActivityId, ActivityStatus, ServerId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTeamInput {
    pub name: String,
    #[serde(default)]
    pub plan: TeamPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterServerInput {
    pub team_id: TeamId,
    pub name: String,
    pub kind: ServerKind,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueKeyInput {
    pub team_id: TeamId,
    pub label: String,
}

/// Row to insert into the activity log. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub server_id: ServerId,
    pub agent_name: Option<String>,
    pub tool_name: String,
    pub status: ActivityStatus,
    pub latency_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrace {
    pub activity_id: ActivityId,
    pub request_payload: Option<Value>,
    pub response_payload: Option<Value>,
    pub trace_id: String,
    pub created_at: DateTime<Utc>,
}
