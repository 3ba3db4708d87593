use crate::api_keys::ApiKeyRepository;
use crate::error::{AuthError, GatewayError};
use crate::store::{Store, StoreProvider};
use crate::types::TeamId;
use sha2::{Digest, Sha256};

pub const SECRET_PREFIX: &str = "gwk_";

/// Resolves a presented credential to the tenant it belongs to.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credential: Option<&str>) -> Result<TeamId, GatewayError>;
}

/// Looks up hashed API keys in the store.
#[derive(Clone)]
pub struct StoreAuthenticator<P> {
    provider: P,
}

impl<P: StoreProvider> StoreAuthenticator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: StoreProvider> Authenticator for StoreAuthenticator<P> {
    fn authenticate(&self, credential: Option<&str>) -> Result<TeamId, GatewayError> {
        let credential = credential
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingCredential)?;
        let store = self.provider.open()?;
        let key = store
            .api_keys()
            .find_by_hash(&hash_secret(credential))?
            .filter(|key| !key.is_revoked())
            .ok_or(AuthError::Unauthorized)?;
        Ok(key.team_id)
    }
}

pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

pub fn generate_secret() -> String {
    let bytes: [u8; 16] = rand::random();
    format!("{SECRET_PREFIX}{}", hex::encode(bytes))
}
