use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Backend integration family a server belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    Chat,
    Workflow,
    Store,
}

impl ServerKind {
    pub const ALL: [ServerKind; 3] = [ServerKind::Chat, ServerKind::Workflow, ServerKind::Store];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Workflow => "workflow",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = String;

    /// Accepts the canonical names and the vendor names used in tool routes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" | "slack" => Ok(Self::Chat),
            "workflow" | "n8n" => Ok(Self::Workflow),
            "store" | "supabase" => Ok(Self::Store),
            other => Err(format!("unknown backend type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Active,
    Inactive,
    Error,
}

impl ServerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamPlan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl TeamPlan {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for TeamPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(format!("unknown plan: {other}")),
        }
    }
}
