use crate::routes::error::map_error;
use crate::{AppState, build_gateway};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use gw_core::servers::ServerRepository;
use gw_core::store::{Store, StoreProvider};
use gw_core::types::GatewayMetrics;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    status: &'static str,
    database: &'static str,
    active_servers: Option<u64>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

#[utoipa::path(get, path = "/", responses((status = 200, body = ServiceInfo)))]
pub(crate) async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "tool-gateway",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = HealthReport), (status = 503, body = HealthReport))
)]
pub(crate) async fn health(State(state): State<AppState>) -> Response {
    let active = state
        .provider
        .open()
        .and_then(|store| store.servers().count_active());
    match active {
        Ok(count) => Json(HealthReport {
            status: "healthy",
            database: "connected",
            active_servers: Some(count),
        })
        .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "unhealthy",
                    database: "unavailable",
                    active_servers: None,
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(get, path = "/metrics", responses((status = 200, body = GatewayMetrics)))]
pub(crate) async fn metrics(State(state): State<AppState>) -> Response {
    match build_gateway(&state).and_then(|gateway| gateway.metrics()) {
        Ok(metrics) => Json(metrics).into_response(),
        Err(err) => map_error(&err, None).into_response(),
    }
}
