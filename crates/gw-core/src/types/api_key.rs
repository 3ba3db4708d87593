use crate::types::{ApiKeyId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub team_id: TeamId,
    pub label: String,
    #[serde(skip)]
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// A freshly issued key. `secret` is only ever available here.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedKey {
    pub key: ApiKey,
    pub secret: String,
}
