use crate::types::enums::TeamPlan;
use crate::types::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub plan: TeamPlan,
    pub created_at: DateTime<Utc>,
}
