//! In-memory store with failure injection for core tests.

use crate::activity::ActivityRepository;
use crate::api_keys::ApiKeyRepository;
use crate::error::{GatewayError, ServerError};
use crate::servers::ServerRepository;
use crate::store::{Store, StoreProvider};
use crate::teams::TeamRepository;
use crate::types::{
    ActivityEvent, ActivityId, ActivityStats, ActivityStatus, ApiKey, ApiKeyId, CreateTeamInput,
    FeedEntry, NewActivity, NewTrace, RegisterServerInput, RequestTrace, Server, ServerId,
    ServerKind, ServerStatus, Team, TeamId, TraceRecordId,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    teams: Vec<Team>,
    servers: Vec<Server>,
    events: Vec<ActivityEvent>,
    traces: Vec<RequestTrace>,
    keys: Vec<ApiKey>,
}

#[derive(Default)]
struct Flags {
    fail_open: AtomicBool,
    fail_event_writes: AtomicBool,
    fail_trace_writes: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryProvider {
    state: Arc<Mutex<State>>,
    flags: Arc<Flags>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(&self, value: bool) {
        self.flags.fail_open.store(value, Ordering::SeqCst);
    }

    pub fn fail_event_writes(&self, value: bool) {
        self.flags.fail_event_writes.store(value, Ordering::SeqCst);
    }

    pub fn fail_trace_writes(&self, value: bool) {
        self.flags.fail_trace_writes.store(value, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn traces(&self) -> Vec<RequestTrace> {
        self.state.lock().unwrap().traces.clone()
    }
}

impl StoreProvider for MemoryProvider {
    type Store = MemoryStore;

    fn open(&self) -> Result<MemoryStore, GatewayError> {
        if self.flags.fail_open.load(Ordering::SeqCst) {
            return Err(GatewayError::internal("database is locked"));
        }
        Ok(MemoryStore {
            state: self.state.clone(),
            flags: self.flags.clone(),
        })
    }
}

pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    flags: Arc<Flags>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

pub struct MemoryRepo<'a> {
    store: &'a MemoryStore,
}

impl Store for MemoryStore {
    type Teams<'a> = MemoryRepo<'a>;
    type Servers<'a> = MemoryRepo<'a>;
    type Activity<'a> = MemoryRepo<'a>;
    type ApiKeys<'a> = MemoryRepo<'a>;

    fn teams(&self) -> MemoryRepo<'_> {
        MemoryRepo { store: self }
    }

    fn servers(&self) -> MemoryRepo<'_> {
        MemoryRepo { store: self }
    }

    fn activity(&self) -> MemoryRepo<'_> {
        MemoryRepo { store: self }
    }

    fn api_keys(&self) -> MemoryRepo<'_> {
        MemoryRepo { store: self }
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&Self) -> Result<T, GatewayError>,
    {
        f(self)
    }
}

impl TeamRepository for MemoryRepo<'_> {
    fn create(&self, input: CreateTeamInput) -> Result<Team, GatewayError> {
        let team = Team {
            id: TeamId::generate(),
            name: input.name,
            plan: input.plan,
            created_at: Utc::now(),
        };
        self.store.state().teams.push(team.clone());
        Ok(team)
    }

    fn get(&self, id: &TeamId) -> Result<Option<Team>, GatewayError> {
        Ok(self.store.state().teams.iter().find(|t| &t.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Team>, GatewayError> {
        Ok(self.store.state().teams.clone())
    }

    fn delete(&self, id: &TeamId) -> Result<bool, GatewayError> {
        let mut state = self.store.state();
        let before = state.teams.len();
        state.teams.retain(|t| &t.id != id);
        let removed: Vec<ServerId> = state
            .servers
            .iter()
            .filter(|s| &s.team_id == id)
            .map(|s| s.id.clone())
            .collect();
        state.servers.retain(|s| &s.team_id != id);
        state.keys.retain(|k| &k.team_id != id);
        let dropped: Vec<ActivityId> = state
            .events
            .iter()
            .filter(|e| removed.contains(&e.server_id))
            .map(|e| e.id.clone())
            .collect();
        state.events.retain(|e| !removed.contains(&e.server_id));
        state.traces.retain(|t| !dropped.contains(&t.activity_id));
        Ok(state.teams.len() != before)
    }

    fn count(&self) -> Result<u64, GatewayError> {
        Ok(self.store.state().teams.len() as u64)
    }
}

impl ServerRepository for MemoryRepo<'_> {
    fn create(&self, input: RegisterServerInput) -> Result<Server, GatewayError> {
        let now = Utc::now();
        let server = Server {
            id: ServerId::generate(),
            team_id: input.team_id,
            name: input.name,
            kind: input.kind,
            status: ServerStatus::Active,
            config: input.config,
            created_at: now,
            updated_at: now,
        };
        self.store.state().servers.push(server.clone());
        Ok(server)
    }

    fn get(&self, id: &ServerId) -> Result<Option<Server>, GatewayError> {
        Ok(self.store.state().servers.iter().find(|s| &s.id == id).cloned())
    }

    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<Server>, GatewayError> {
        Ok(self
            .store
            .state()
            .servers
            .iter()
            .filter(|s| &s.team_id == team_id)
            .cloned()
            .collect())
    }

    fn find_active(
        &self,
        team_id: &TeamId,
        kind: ServerKind,
    ) -> Result<Option<Server>, GatewayError> {
        Ok(self
            .store
            .state()
            .servers
            .iter()
            .rev()
            .find(|s| &s.team_id == team_id && s.kind == kind && s.status == ServerStatus::Active)
            .cloned())
    }

    fn set_status(&self, id: &ServerId, status: ServerStatus) -> Result<Server, GatewayError> {
        let mut state = self.store.state();
        let server = state
            .servers
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or(ServerError::NotFound)?;
        server.status = status;
        server.updated_at = Utc::now();
        Ok(server.clone())
    }

    fn delete(&self, id: &ServerId) -> Result<bool, GatewayError> {
        let mut state = self.store.state();
        let before = state.servers.len();
        state.servers.retain(|s| &s.id != id);
        Ok(state.servers.len() != before)
    }

    fn count_active(&self) -> Result<u64, GatewayError> {
        Ok(self
            .store
            .state()
            .servers
            .iter()
            .filter(|s| s.status == ServerStatus::Active)
            .count() as u64)
    }
}

impl ActivityRepository for MemoryRepo<'_> {
    fn insert_event(&self, event: NewActivity) -> Result<ActivityEvent, GatewayError> {
        if self.store.flags.fail_event_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::internal("disk I/O error"));
        }
        let event = ActivityEvent {
            id: ActivityId::generate(),
            server_id: event.server_id,
            agent_name: event.agent_name,
            tool_name: event.tool_name,
            status: event.status,
            latency_ms: event.latency_ms,
            created_at: event.created_at,
        };
        self.store.state().events.push(event.clone());
        Ok(event)
    }

    fn insert_trace(&self, trace: NewTrace) -> Result<RequestTrace, GatewayError> {
        if self.store.flags.fail_trace_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::internal("disk I/O error"));
        }
        let trace = RequestTrace {
            id: TraceRecordId::generate(),
            activity_id: trace.activity_id,
            request_payload: trace.request_payload,
            response_payload: trace.response_payload,
            trace_id: trace.trace_id,
            created_at: trace.created_at,
        };
        self.store.state().traces.push(trace.clone());
        Ok(trace)
    }

    fn recent_for_team(
        &self,
        team_id: &TeamId,
        limit: u32,
    ) -> Result<Vec<FeedEntry>, GatewayError> {
        let state = self.store.state();
        let mut entries: Vec<FeedEntry> = state
            .events
            .iter()
            .filter_map(|event| {
                let server = state.servers.iter().find(|s| s.id == event.server_id)?;
                (&server.team_id == team_id).then(|| FeedEntry {
                    event: event.clone(),
                    team_id: server.team_id.clone(),
                    server_name: server.name.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.event.created_at.cmp(&a.event.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    fn get_event(&self, id: &ActivityId) -> Result<Option<FeedEntry>, GatewayError> {
        let state = self.store.state();
        let Some(event) = state.events.iter().find(|e| &e.id == id) else {
            return Ok(None);
        };
        Ok(state
            .servers
            .iter()
            .find(|s| s.id == event.server_id)
            .map(|server| FeedEntry {
                event: event.clone(),
                team_id: server.team_id.clone(),
                server_name: server.name.clone(),
            }))
    }

    fn traces_for(&self, id: &ActivityId) -> Result<Vec<RequestTrace>, GatewayError> {
        Ok(self
            .store
            .state()
            .traces
            .iter()
            .filter(|t| &t.activity_id == id)
            .cloned()
            .collect())
    }

    fn stats(&self) -> Result<ActivityStats, GatewayError> {
        let state = self.store.state();
        Ok(ActivityStats {
            total: state.events.len() as u64,
            succeeded: state
                .events
                .iter()
                .filter(|e| e.status == ActivityStatus::Success)
                .count() as u64,
        })
    }
}

impl ApiKeyRepository for MemoryRepo<'_> {
    fn insert(&self, key: ApiKey) -> Result<ApiKey, GatewayError> {
        self.store.state().keys.push(key.clone());
        Ok(key)
    }

    fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, GatewayError> {
        Ok(self
            .store
            .state()
            .keys
            .iter()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<ApiKey>, GatewayError> {
        Ok(self
            .store
            .state()
            .keys
            .iter()
            .filter(|k| &k.team_id == team_id)
            .cloned()
            .collect())
    }

    fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, GatewayError> {
        let mut state = self.store.state();
        let Some(key) = state.keys.iter_mut().find(|k| &k.id == id) else {
            return Ok(None);
        };
        if key.revoked_at.is_none() {
            key.revoked_at = Some(Utc::now());
        }
        Ok(Some(key.clone()))
    }
}
