use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gw_core::GatewayError;
use gw_core::error::{
    ActivityError, AuthError, DispatchError, KeyError, ServerError, TeamError,
};
use gw_core::types::ResponseEnvelope;
use gw_core::types::envelope::error_code;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &GatewayError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code) = classify(err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorEnvelope {
            code,
            message: err.to_string(),
            correlation_id,
        }),
    )
}

/// Failure envelope for a tool call, with the status code the error maps to.
pub fn envelope_error(tool: &str, err: &GatewayError) -> Response {
    let (status, _) = classify(err);
    (status, Json(ResponseEnvelope::failure(tool, err))).into_response()
}

/// Status code and envelope code for `err`. Codes come from
/// [`error_code`], so tool envelopes and plain error bodies agree.
pub fn classify(err: &GatewayError) -> (StatusCode, &'static str) {
    let status = match err {
        GatewayError::Team(TeamError::NotFound)
        | GatewayError::Server(ServerError::NotFound)
        | GatewayError::Key(KeyError::NotFound)
        | GatewayError::Activity(ActivityError::NotFound)
        | GatewayError::Dispatch(DispatchError::NotConfigured { .. }) => StatusCode::NOT_FOUND,
        GatewayError::Team(TeamError::InvalidInput { .. })
        | GatewayError::Server(ServerError::InvalidInput { .. })
        | GatewayError::Key(KeyError::InvalidInput { .. })
        | GatewayError::Dispatch(DispatchError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
        GatewayError::Auth(AuthError::MissingCredential | AuthError::Unauthorized) => {
            StatusCode::UNAUTHORIZED
        }
        GatewayError::Dispatch(DispatchError::BackendFailure { .. }) => StatusCode::BAD_GATEWAY,
        GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_code(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::types::ServerKind;

    #[test]
    fn dispatch_errors_map_to_gateway_statuses() {
        let not_configured: GatewayError = DispatchError::NotConfigured {
            kind: ServerKind::Chat,
        }
        .into();
        assert_eq!(classify(&not_configured).0, StatusCode::NOT_FOUND);

        let failed: GatewayError = DispatchError::BackendFailure {
            message: "timeout".to_string(),
        }
        .into();
        assert_eq!(classify(&failed).0, StatusCode::BAD_GATEWAY);

        let denied: GatewayError = AuthError::Unauthorized.into();
        assert_eq!(classify(&denied), (StatusCode::UNAUTHORIZED, "unauthorized"));

        let missing: GatewayError = ActivityError::NotFound.into();
        let (status, code) = classify(&missing);
        assert_eq!((status, code), (StatusCode::NOT_FOUND, "not_found"));
        assert_eq!(
            ResponseEnvelope::failure("get_trace", &missing).error.unwrap().code,
            code
        );

        let internal = GatewayError::internal("database is locked");
        let (status, body) = map_error(&internal, Some("corr_1".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.correlation_id.as_deref(), Some("corr_1"));
    }
}
