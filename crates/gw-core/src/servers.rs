use crate::error::GatewayError;
use crate::types::{RegisterServerInput, Server, ServerId, ServerKind, ServerStatus, TeamId};

pub trait ServerRepository {
    fn create(&self, input: RegisterServerInput) -> Result<Server, GatewayError>;
    fn get(&self, id: &ServerId) -> Result<Option<Server>, GatewayError>;
    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<Server>, GatewayError>;
    /// Newest active server of `kind` owned by `team_id`.
    fn find_active(&self, team_id: &TeamId, kind: ServerKind)
    -> Result<Option<Server>, GatewayError>;
    fn set_status(&self, id: &ServerId, status: ServerStatus) -> Result<Server, GatewayError>;
    fn delete(&self, id: &ServerId) -> Result<bool, GatewayError>;
    fn count_active(&self) -> Result<u64, GatewayError>;
}
