use crate::error::GatewayError;
use crate::types::{CreateTeamInput, Team, TeamId};

pub trait TeamRepository {
    fn create(&self, input: CreateTeamInput) -> Result<Team, GatewayError>;
    fn get(&self, id: &TeamId) -> Result<Option<Team>, GatewayError>;
    fn list(&self) -> Result<Vec<Team>, GatewayError>;
    /// Removes the team together with its servers, keys, events and traces.
    fn delete(&self, id: &TeamId) -> Result<bool, GatewayError>;
    fn count(&self) -> Result<u64, GatewayError>;
}
