pub mod activity;
pub mod error;
pub mod health;
pub mod tools;

use crate::middleware::correlation::correlation_middleware;
use crate::{AppState, openapi};
use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(tools::router(state.clone()))
        .merge(activity::router(state.clone()))
        .merge(health::router(state))
        .merge(openapi::router())
        .layer(middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
