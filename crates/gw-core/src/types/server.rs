use crate::types::enums::{ServerKind, ServerStatus};
use crate::types::{ServerId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One configured backend integration owned by a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Server {
    pub id: ServerId,
    pub team_id: TeamId,
    pub name: String,
    pub kind: ServerKind,
    pub status: ServerStatus,
    /// Backend credentials and endpoints. Never serialized back to clients.
    #[serde(skip)]
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Server {
    /// Reads a string entry from `config`.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}
