use crate::activity::ActivityRepository;
use crate::api_keys::ApiKeyRepository;
use crate::servers::ServerRepository;
use crate::teams::TeamRepository;
use crate::GatewayError;

pub trait Store {
    type Teams<'a>: TeamRepository
    where
        Self: 'a;
    type Servers<'a>: ServerRepository
    where
        Self: 'a;
    type Activity<'a>: ActivityRepository
    where
        Self: 'a;
    type ApiKeys<'a>: ApiKeyRepository
    where
        Self: 'a;

    fn teams(&self) -> Self::Teams<'_>;
    fn servers(&self) -> Self::Servers<'_>;
    fn activity(&self) -> Self::Activity<'_>;
    fn api_keys(&self) -> Self::ApiKeys<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&Self) -> Result<T, GatewayError>;
}

/// Opens short-lived store handles.
///
/// Async code opens a store, uses it synchronously and drops it before the
/// next `.await`; handles are never shared between tasks.
pub trait StoreProvider: Clone + Send + Sync + 'static {
    type Store: Store;

    fn open(&self) -> Result<Self::Store, GatewayError>;
}
