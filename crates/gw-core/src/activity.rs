use crate::error::GatewayError;
use crate::store::{Store, StoreProvider};
use crate::types::{
    ActivityEvent, ActivityId, ActivityStats, FeedEntry, NewActivity, NewTrace, RequestTrace,
    TeamId,
};
use gw_events::feed::{FeedError, FeedSource};

pub trait ActivityRepository {
    fn insert_event(&self, event: NewActivity) -> Result<ActivityEvent, GatewayError>;
    fn insert_trace(&self, trace: NewTrace) -> Result<RequestTrace, GatewayError>;
    /// Newest-first events of servers owned by `team_id`.
    fn recent_for_team(&self, team_id: &TeamId, limit: u32)
    -> Result<Vec<FeedEntry>, GatewayError>;
    fn get_event(&self, id: &ActivityId) -> Result<Option<FeedEntry>, GatewayError>;
    fn traces_for(&self, id: &ActivityId) -> Result<Vec<RequestTrace>, GatewayError>;
    fn stats(&self) -> Result<ActivityStats, GatewayError>;
}

/// Serves feed reads from a fresh store handle per tick.
#[derive(Clone)]
pub struct StoreFeedSource<P> {
    provider: P,
}

impl<P: StoreProvider> StoreFeedSource<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: StoreProvider> FeedSource for StoreFeedSource<P> {
    fn recent(&self, team_id: &TeamId, limit: u32) -> Result<Vec<FeedEntry>, FeedError> {
        let unavailable = |err: GatewayError| FeedError::StoreUnavailable {
            message: err.to_string(),
        };
        let store = self.provider.open().map_err(unavailable)?;
        store
            .activity()
            .recent_for_team(team_id, limit)
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryProvider;
    use crate::types::{ActivityStatus, CreateTeamInput, RegisterServerInput, ServerKind, TeamPlan};
    use crate::{servers::ServerRepository, teams::TeamRepository};
    use chrono::Utc;

    #[test]
    fn feed_source_reads_team_events() {
        let provider = MemoryProvider::new();
        let store = provider.open().unwrap();
        let team = TeamRepository::create(
            &store.teams(),
            CreateTeamInput {
                name: "acme".to_string(),
                plan: TeamPlan::Free,
            })
            .unwrap();
        let server = ServerRepository::create(
            &store.servers(),
            RegisterServerInput {
                team_id: team.id.clone(),
                name: "slack".to_string(),
                kind: ServerKind::Chat,
                config: serde_json::Value::Null,
            })
            .unwrap();
        store
            .activity()
            .insert_event(NewActivity {
                server_id: server.id,
                agent_name: None,
                tool_name: "post_message".to_string(),
                status: ActivityStatus::Success,
                latency_ms: Some(3),
                created_at: Utc::now(),
            })
            .unwrap();

        let source = StoreFeedSource::new(provider.clone());
        let entries = source.recent(&team.id, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].server_name, "slack");
    }

    #[test]
    fn feed_source_maps_open_failure() {
        let provider = MemoryProvider::new();
        provider.fail_open(true);
        let source = StoreFeedSource::new(provider);
        let err = source.recent(&TeamId::generate(), 10).unwrap_err();
        assert!(matches!(err, FeedError::StoreUnavailable { .. }));
    }
}
