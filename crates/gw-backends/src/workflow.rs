//! n8n public REST API and webhook triggers.

use crate::http::{
    JsonShape, PlannedRequest, bare_tool, config_value, execute, optional_u64, required_json,
    string_list, unknown_tool,
};
use async_trait::async_trait;
use gw_core::backend::{Backend, BackendError, optional_str, required_str};
use gw_core::types::{Server, ServerKind};
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};

const API_KEY_HEADER: &str = "X-N8N-API-KEY";

pub struct WorkflowBackend {
    client: Client,
}

impl WorkflowBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for WorkflowBackend {
    fn kind(&self) -> ServerKind {
        ServerKind::Workflow
    }

    async fn call(
        &self,
        server: &Server,
        tool: &str,
        params: &Value,
    ) -> Result<Value, BackendError> {
        let planned = plan(tool, params)?;
        let base_url = config_value(server, "base_url")?;
        let api_key = config_value(server, "api_key")?;
        let request = planned
            .header(API_KEY_HEADER, api_key)
            .into_request(&self.client, base_url)?;
        execute(request).await
    }
}

pub fn plan(tool: &str, params: &Value) -> Result<PlannedRequest, BackendError> {
    let planned = match bare_tool(tool, "n8n_") {
        "list_workflows" => PlannedRequest::get("api/v1/workflows")
            .query("limit", optional_u64(params, "limit", 100)?),
        "get_workflow" => workflow(Method::GET, params)?,
        "create_workflow" => PlannedRequest::post("api/v1/workflows").body(json!({
            "name": required_str(params, "name")?,
            "nodes": required_json(params, "nodes", JsonShape::Array)?,
            "connections": required_json(params, "connections", JsonShape::Object)?,
            "settings": params.get("settings").filter(|v| v.is_object()).cloned().unwrap_or_else(|| json!({})),
        })),
        "update_workflow" => workflow(Method::PUT, params)?.body(workflow_changes(params)?),
        "delete_workflow" => workflow(Method::DELETE, params)?,
        "activate_workflow" => {
            let action = if params.get("activate").and_then(Value::as_bool) == Some(false) {
                "deactivate"
            } else {
                "activate"
            };
            workflow(Method::POST, params)?.segment(action)?
        }
        "deactivate_workflow" => workflow(Method::POST, params)?.segment("deactivate")?,
        "list_executions" => {
            let mut planned = PlannedRequest::get("api/v1/executions")
                .query("limit", optional_u64(params, "limit", 20)?);
            if let Some(workflow_id) = optional_str(params, "workflow_id") {
                planned = planned.query("workflowId", workflow_id);
            }
            if let Some(status) = optional_str(params, "status") {
                planned = planned.query("status", status);
            }
            planned
        }
        "get_execution" => execution(Method::GET, params)?,
        "delete_execution" => execution(Method::DELETE, params)?,
        "retry_execution" => execution(Method::POST, params)?.segment("retry")?,
        "execute_workflow" => {
            let data = params.get("data").cloned().unwrap_or_else(|| json!({}));
            PlannedRequest::post("webhook")
                .segments(required_str(params, "webhook_path")?)?
                .body(data)
        }
        "list_tags" => PlannedRequest::get("api/v1/tags"),
        "create_tag" => {
            PlannedRequest::post("api/v1/tags").body(json!({ "name": required_str(params, "name")? }))
        }
        "update_workflow_tags" => {
            let tags: Vec<Value> = string_list(params, "tag_ids")?
                .into_iter()
                .map(|id| json!({ "id": id }))
                .collect();
            workflow(Method::PUT, params)?
                .segment("tags")?
                .body(Value::Array(tags))
        }
        "list_credentials" => PlannedRequest::get("api/v1/credentials"),
        "get_credential" => PlannedRequest::get("api/v1/credentials")
            .segment(required_str(params, "credential_id")?)?,
        _ => return Err(unknown_tool(tool)),
    };
    Ok(planned)
}

fn workflow(method: Method, params: &Value) -> Result<PlannedRequest, BackendError> {
    PlannedRequest::new(method, "api/v1/workflows").segment(required_str(params, "workflow_id")?)
}

fn execution(method: Method, params: &Value) -> Result<PlannedRequest, BackendError> {
    PlannedRequest::new(method, "api/v1/executions")
        .segment(required_str(params, "execution_id")?)
}

/// Only the fields the caller supplied are sent.
fn workflow_changes(params: &Value) -> Result<Value, BackendError> {
    let mut changes = Map::new();
    if let Some(name) = optional_str(params, "name") {
        changes.insert("name".to_string(), json!(name));
    }
    if params.get("nodes").is_some() {
        let nodes = required_json(params, "nodes", JsonShape::Array)?;
        changes.insert("nodes".to_string(), nodes.clone());
    }
    if params.get("connections").is_some() {
        let connections = required_json(params, "connections", JsonShape::Object)?;
        changes.insert("connections".to_string(), connections.clone());
    }
    if changes.is_empty() {
        return Err(BackendError::InvalidParams {
            message: "nothing to update: pass `name`, `nodes` or `connections`".to_string(),
        });
    }
    Ok(Value::Object(changes))
}
