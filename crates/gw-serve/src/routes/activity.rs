use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::{AppState, authenticate, build_gateway};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use gw_core::error::ActivityError;
use gw_core::types::{ActivityDetail, ActivityId, FeedEntry};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct ActivityQuery {
    /// Defaults to 50, capped at 200.
    limit: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/activity", get(list_activity))
        .route("/activity/stream", get(stream_activity))
        .route("/activity/{id}/trace", get(activity_trace))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/activity",
    params(ActivityQuery, ("x-gateway-key" = String, Header, description = "Tenant API key")),
    responses((status = 200, body = Vec<FeedEntry>))
)]
pub(crate) async fn list_activity(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> Response {
    let result = authenticate(&state, &headers).and_then(|team_id| {
        build_gateway(&state)?
            .activity()
            .recent(&team_id, query.limit)
    });
    match result {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/activity/{id}/trace",
    params(
        ("id" = String, Path, description = "Activity event ID"),
        ("x-gateway-key" = String, Header, description = "Tenant API key")
    ),
    responses((status = 200, body = ActivityDetail))
)]
pub(crate) async fn activity_trace(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let result = authenticate(&state, &headers).and_then(|team_id| {
        let id = ActivityId::new(id).map_err(|_| ActivityError::NotFound)?;
        build_gateway(&state)?.activity().detail(&team_id, &id)
    });
    match result {
        Ok(detail) => Json(detail).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/activity/stream",
    params(("x-gateway-key" = String, Header, description = "Tenant API key")),
    responses((status = 200, description = "Server-sent snapshots of the tenant's newest events"))
)]
pub(crate) async fn stream_activity(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
) -> Response {
    match authenticate(&state, &headers) {
        Ok(team_id) => crate::sse::feed(&state, team_id),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}
