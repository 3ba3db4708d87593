use crate::error::{
    ActivityError, DispatchError, GatewayError, KeyError, ServerError, TeamError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Body returned by every tool dispatch, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
}

impl ResponseEnvelope {
    pub fn success(tool: &str, data: Value) -> Self {
        Self {
            success: true,
            tool: tool.to_string(),
            message: Some(format!("Tool {tool} executed successfully")),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(tool: &str, err: &GatewayError) -> Self {
        Self {
            success: false,
            tool: tool.to_string(),
            message: None,
            data: None,
            error: Some(EnvelopeError {
                code: error_code(err).to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// Stable machine-readable code for an error surfaced in an envelope.
pub fn error_code(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::Dispatch(DispatchError::NotConfigured { .. }) => "not_configured",
        GatewayError::Dispatch(DispatchError::BackendFailure { .. }) => "backend_failure",
        GatewayError::Dispatch(DispatchError::InvalidRequest { .. }) => "invalid_request",
        GatewayError::Auth(_) => "unauthorized",
        GatewayError::Team(TeamError::NotFound)
        | GatewayError::Server(ServerError::NotFound)
        | GatewayError::Key(KeyError::NotFound)
        | GatewayError::Activity(ActivityError::NotFound) => "not_found",
        GatewayError::Team(TeamError::InvalidInput { .. })
        | GatewayError::Server(ServerError::InvalidInput { .. })
        | GatewayError::Key(KeyError::InvalidInput { .. }) => "invalid_input",
        GatewayError::Internal { .. } => "internal_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServerKind;
    use serde_json::json;

    #[test]
    fn success_envelope_shape() {
        let envelope = ResponseEnvelope::success("post_message", json!({"ts": "1"}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "tool": "post_message",
                "message": "Tool post_message executed successfully",
                "data": {"ts": "1"}
            })
        );
    }

    #[test]
    fn not_configured_envelope_shape() {
        let err = GatewayError::from(DispatchError::NotConfigured {
            kind: ServerKind::Chat,
        });
        let envelope = ResponseEnvelope::failure("post_message", &err);
        assert!(!envelope.success);
        let error = envelope.error.unwrap();
        assert_eq!(error.code, "not_configured");
        assert_eq!(error.message, "no chat server configured for team");
    }

    #[test]
    fn management_errors_keep_their_own_codes() {
        assert_eq!(error_code(&GatewayError::from(TeamError::NotFound)), "not_found");
        assert_eq!(error_code(&GatewayError::from(ActivityError::NotFound)), "not_found");
        let invalid = ServerError::InvalidInput {
            message: "server name must not be empty".to_string(),
        };
        assert_eq!(error_code(&GatewayError::from(invalid)), "invalid_input");
        let bad_body = DispatchError::InvalidRequest {
            message: "expected object".to_string(),
        };
        assert_eq!(error_code(&GatewayError::from(bad_body)), "invalid_request");
    }
}
