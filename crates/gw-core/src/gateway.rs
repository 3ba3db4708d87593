use crate::activity::ActivityRepository;
use crate::api_keys::ApiKeyRepository;
use crate::auth::{generate_secret, hash_secret};
use crate::error::{ActivityError, GatewayError, KeyError, ServerError, TeamError};
use crate::servers::ServerRepository;
use crate::store::Store;
use crate::teams::TeamRepository;
use crate::types::{
    ActivityDetail, ActivityId, ApiKey, ApiKeyId, CreateTeamInput, FeedEntry, GatewayMetrics,
    IssueKeyInput, IssuedKey, RegisterServerInput, Server, ServerId, ServerStatus, Team, TeamId,
};
use chrono::Utc;

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 50;
pub const MAX_ACTIVITY_LIMIT: u32 = 200;

/// Management and read APIs over one store handle.
pub struct Gateway<S: Store> {
    store: S,
}

impl<S: Store> Gateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn teams(&self) -> TeamsApi<'_, S> {
        TeamsApi { core: self }
    }

    pub fn servers(&self) -> ServersApi<'_, S> {
        ServersApi { core: self }
    }

    pub fn keys(&self) -> KeysApi<'_, S> {
        KeysApi { core: self }
    }

    pub fn activity(&self) -> ActivityApi<'_, S> {
        ActivityApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> Result<GatewayMetrics, GatewayError> {
        let stats = self.store.activity().stats()?;
        Ok(GatewayMetrics {
            total_requests: stats.total,
            success_rate: stats.success_rate(),
            total_teams: self.store.teams().count()?,
            total_servers: self.store.servers().count_active()?,
        })
    }
}

pub struct TeamsApi<'a, S: Store> {
    core: &'a Gateway<S>,
}

impl<S: Store> TeamsApi<'_, S> {
    /// Creates a team together with its first API key.
    pub fn create(&self, input: CreateTeamInput) -> Result<(Team, IssuedKey), GatewayError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TeamError::InvalidInput {
                message: "team name must not be empty".to_string(),
            }
            .into());
        }
        self.core.store.with_tx(|store| {
            let team = store.teams().create(CreateTeamInput { name, ..input })?;
            let issued = issue_key(store, &team.id, "default")?;
            Ok((team, issued))
        })
    }

    pub fn get(&self, id: &TeamId) -> Result<Team, GatewayError> {
        self.core
            .store
            .teams()
            .get(id)?
            .ok_or_else(|| TeamError::NotFound.into())
    }

    pub fn list(&self) -> Result<Vec<Team>, GatewayError> {
        self.core.store.teams().list()
    }

    pub fn delete(&self, id: &TeamId) -> Result<(), GatewayError> {
        if self.core.store.teams().delete(id)? {
            Ok(())
        } else {
            Err(TeamError::NotFound.into())
        }
    }
}

pub struct ServersApi<'a, S: Store> {
    core: &'a Gateway<S>,
}

impl<S: Store> ServersApi<'_, S> {
    pub fn register(&self, input: RegisterServerInput) -> Result<Server, GatewayError> {
        if input.name.trim().is_empty() {
            return Err(ServerError::InvalidInput {
                message: "server name must not be empty".to_string(),
            }
            .into());
        }
        if !(input.config.is_object() || input.config.is_null()) {
            return Err(ServerError::InvalidInput {
                message: "server config must be a JSON object".to_string(),
            }
            .into());
        }
        if self.core.store.teams().get(&input.team_id)?.is_none() {
            return Err(TeamError::NotFound.into());
        }
        self.core.store.servers().create(input)
    }

    pub fn get(&self, id: &ServerId) -> Result<Server, GatewayError> {
        self.core
            .store
            .servers()
            .get(id)?
            .ok_or_else(|| ServerError::NotFound.into())
    }

    pub fn list(&self, team_id: &TeamId) -> Result<Vec<Server>, GatewayError> {
        self.core.store.servers().list_for_team(team_id)
    }

    pub fn set_status(&self, id: &ServerId, status: ServerStatus) -> Result<Server, GatewayError> {
        self.get(id)?;
        self.core.store.servers().set_status(id, status)
    }

    pub fn delete(&self, id: &ServerId) -> Result<(), GatewayError> {
        if self.core.store.servers().delete(id)? {
            Ok(())
        } else {
            Err(ServerError::NotFound.into())
        }
    }
}

pub struct KeysApi<'a, S: Store> {
    core: &'a Gateway<S>,
}

impl<S: Store> KeysApi<'_, S> {
    pub fn issue(&self, input: IssueKeyInput) -> Result<IssuedKey, GatewayError> {
        let label = input.label.trim();
        if label.is_empty() {
            return Err(KeyError::InvalidInput {
                message: "key label must not be empty".to_string(),
            }
            .into());
        }
        if self.core.store.teams().get(&input.team_id)?.is_none() {
            return Err(TeamError::NotFound.into());
        }
        issue_key(&self.core.store, &input.team_id, label)
    }

    pub fn list(&self, team_id: &TeamId) -> Result<Vec<ApiKey>, GatewayError> {
        self.core.store.api_keys().list_for_team(team_id)
    }

    pub fn revoke(&self, id: &ApiKeyId) -> Result<ApiKey, GatewayError> {
        self.core
            .store
            .api_keys()
            .revoke(id)?
            .ok_or_else(|| KeyError::NotFound.into())
    }
}

fn issue_key<S: Store>(
    store: &S,
    team_id: &TeamId,
    label: &str,
) -> Result<IssuedKey, GatewayError> {
    let secret = generate_secret();
    let key = store.api_keys().insert(ApiKey {
        id: ApiKeyId::generate(),
        team_id: team_id.clone(),
        label: label.to_string(),
        key_hash: hash_secret(&secret),
        created_at: Utc::now(),
        revoked_at: None,
    })?;
    Ok(IssuedKey { key, secret })
}

pub struct ActivityApi<'a, S: Store> {
    core: &'a Gateway<S>,
}

impl<S: Store> ActivityApi<'_, S> {
    /// Newest-first events of the team, `limit` clamped to `1..=200`.
    pub fn recent(
        &self,
        team_id: &TeamId,
        limit: Option<u32>,
    ) -> Result<Vec<FeedEntry>, GatewayError> {
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        self.core.store.activity().recent_for_team(team_id, limit)
    }

    /// One event of the team with its traces. Other teams' events read as
    /// not found.
    pub fn detail(
        &self,
        team_id: &TeamId,
        id: &ActivityId,
    ) -> Result<ActivityDetail, GatewayError> {
        let entry = self
            .core
            .store
            .activity()
            .get_event(id)?
            .filter(|entry| &entry.team_id == team_id)
            .ok_or(ActivityError::NotFound)?;
        let traces = self.core.store.activity().traces_for(id)?;
        Ok(ActivityDetail { entry, traces })
    }
}
