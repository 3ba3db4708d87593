use crate::routes::activity::ActivityQuery;
use crate::routes::error::ErrorEnvelope;
use crate::routes::health::{HealthReport, ServiceInfo};
use crate::routes::tools::ToolRequest;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use gw_core::types::{
    ActivityDetail, ActivityEvent, ActivityStatus, EnvelopeError, FeedEntry, GatewayMetrics,
    RequestTrace, ResponseEnvelope, ServerKind,
};
use gw_events::{ActivityId, ServerId, TeamId, TraceRecordId};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::tools::call_tool,
        crate::routes::activity::list_activity,
        crate::routes::activity::activity_trace,
        crate::routes::activity::stream_activity,
        crate::routes::health::root,
        crate::routes::health::health,
        crate::routes::health::metrics,
    ),
    components(schemas(
        ToolRequest,
        ActivityQuery,
        ResponseEnvelope,
        EnvelopeError,
        ErrorEnvelope,
        FeedEntry,
        ActivityEvent,
        ActivityStatus,
        ActivityDetail,
        RequestTrace,
        GatewayMetrics,
        ServiceInfo,
        HealthReport,
        ServerKind,
        TeamId,
        ServerId,
        ActivityId,
        TraceRecordId,
    )),
    tags((name = "gateway", description = "Multi-tenant tool gateway"))
)]
pub struct ApiDoc;

pub fn document() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
