use crate::routes::error::envelope_error;
use crate::{AppState, authenticate};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use gw_core::GatewayError;
use gw_core::dispatcher::ToolCall;
use gw_core::error::{AuthError, DispatchError};
use gw_core::types::{ResponseEnvelope, ServerKind, TeamId};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct ToolRequest {
    /// Ignored when it disagrees with the path.
    tool_name: Option<String>,
    #[serde(default)]
    parameters: Value,
    /// Must match the tenant of the presented key when given.
    team_id: Option<TeamId>,
    agent_name: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools/{kind}/{tool_name}", post(call_tool))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/tools/{kind}/{tool_name}",
    params(
        ("kind" = String, Path, description = "chat, workflow or store (aliases slack, n8n, supabase)"),
        ("tool_name" = String, Path, description = "Tool to invoke"),
        ("x-gateway-key" = String, Header, description = "Tenant API key")
    ),
    request_body = ToolRequest,
    responses(
        (status = 200, body = ResponseEnvelope),
        (status = 401, body = ResponseEnvelope),
        (status = 404, body = ResponseEnvelope),
        (status = 502, body = ResponseEnvelope)
    )
)]
pub(crate) async fn call_tool(
    State(state): State<AppState>,
    Path((kind, tool_name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Result<Json<ToolRequest>, JsonRejection>,
) -> Response {
    let team_id = match authenticate(&state, &headers) {
        Ok(team_id) => team_id,
        Err(err) => return envelope_error(&tool_name, &err),
    };
    let kind = match kind.parse::<ServerKind>() {
        Ok(kind) => kind,
        Err(message) => return envelope_error(&tool_name, &invalid(message)),
    };
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return envelope_error(&tool_name, &invalid(rejection.body_text())),
    };
    if request.team_id.as_ref().is_some_and(|claimed| claimed != &team_id) {
        return envelope_error(&tool_name, &AuthError::Unauthorized.into());
    }
    if let Some(named) = request.tool_name.as_deref().filter(|named| *named != tool_name) {
        tracing::debug!(path = %tool_name, body = %named, "body tool name ignored");
    }

    let call = ToolCall {
        kind,
        tool_name: tool_name.clone(),
        parameters: request.parameters,
        agent_name: request.agent_name,
    };
    match state.dispatcher.dispatch(&team_id, call).await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(err) => envelope_error(&tool_name, &err),
    }
}

fn invalid(message: String) -> GatewayError {
    DispatchError::InvalidRequest { message }.into()
}
