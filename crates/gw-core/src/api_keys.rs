use crate::error::GatewayError;
use crate::types::{ApiKey, ApiKeyId, TeamId};

pub trait ApiKeyRepository {
    fn insert(&self, key: ApiKey) -> Result<ApiKey, GatewayError>;
    fn find_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, GatewayError>;
    fn list_for_team(&self, team_id: &TeamId) -> Result<Vec<ApiKey>, GatewayError>;
    fn revoke(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, GatewayError>;
}
