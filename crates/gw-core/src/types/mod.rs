pub mod activity;
pub mod api_key;
pub mod envelope;
pub mod enums;
pub mod io;
pub mod metrics;
pub mod server;
pub mod team;

pub use activity::ActivityDetail;
pub use api_key::{ApiKey, IssuedKey};
pub use envelope::{EnvelopeError, ResponseEnvelope};
pub use enums::{ServerKind, ServerStatus, TeamPlan};
pub use gw_events::ids::{ActivityId, ApiKeyId, ServerId, TeamId, TraceRecordId};
pub use gw_events::types::{ActivityEvent, ActivityStatus, FeedEntry, RequestTrace};
pub use io::{CreateTeamInput, IssueKeyInput, NewActivity, NewTrace, RegisterServerInput};
pub use metrics::{ActivityStats, GatewayMetrics};
pub use server::Server;
pub use team::Team;
