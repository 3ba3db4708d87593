pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod sse;

use axum::Router;
use axum::http::HeaderMap;
use gw_core::auth::{Authenticator, StoreAuthenticator};
use gw_core::backend::BackendRegistry;
use gw_core::dispatcher::Dispatcher;
use gw_core::store::StoreProvider;
use gw_core::types::TeamId;
use gw_core::{Gateway, GatewayError};
use gw_db::{DbProvider, DbStore};
use gw_events::FeedConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const CREDENTIAL_HEADER: &str = "x-gateway-key";

#[derive(Clone)]
pub struct AppState {
    pub provider: DbProvider,
    pub dispatcher: Dispatcher<DbProvider>,
    pub authenticator: Arc<dyn Authenticator>,
    pub feed: FeedConfig,
}

impl AppState {
    pub fn new(provider: DbProvider, backends: BackendRegistry, feed: FeedConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(provider.clone(), backends),
            authenticator: Arc::new(StoreAuthenticator::new(provider.clone())),
            provider,
            feed,
        }
    }
}

pub fn build_gateway(state: &AppState) -> Result<Gateway<DbStore>, GatewayError> {
    Ok(Gateway::new(state.provider.open()?))
}

/// Resolves the tenant from the `x-gateway-key` header.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<TeamId, GatewayError> {
    let credential = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|value| value.to_str().ok());
    state.authenticator.authenticate(credential)
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gateway listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
