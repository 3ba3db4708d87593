//! Slack Web API.

use crate::http::{
    PlannedRequest, bare_tool, config_value, execute, optional_bool, optional_u64, string_list,
    unknown_tool,
};
use async_trait::async_trait;
use gw_core::backend::{Backend, BackendError, optional_str, required_str};
use gw_core::types::{Server, ServerKind};
use reqwest::Client;
use serde_json::{Map, Value, json};

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

pub struct ChatBackend {
    client: Client,
}

impl ChatBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for ChatBackend {
    fn kind(&self) -> ServerKind {
        ServerKind::Chat
    }

    async fn call(
        &self,
        server: &Server,
        tool: &str,
        params: &Value,
    ) -> Result<Value, BackendError> {
        let mut planned = plan(tool, params)?;
        let name = bare_tool(tool, "slack_");
        let token = config_value(server, token_key(name))?;
        let base_url = server.config_str("base_url").unwrap_or(DEFAULT_BASE_URL);
        tracing::debug!(server_id = %server.id, method = %planned.path(), "slack call");
        if name == "upload_file" {
            return self.upload(base_url, token, planned, params).await;
        }
        if WORKSPACE_SCOPED.contains(&name) {
            let workspace = self.workspace_id(base_url, token).await?;
            if let Some(Value::Object(body)) = planned.body.as_mut() {
                body.insert("team_id".to_string(), json!(workspace));
            }
        }
        self.send(planned, base_url, token).await
    }
}

impl ChatBackend {
    async fn send(
        &self,
        planned: PlannedRequest,
        base_url: &str,
        token: &str,
    ) -> Result<Value, BackendError> {
        let request = planned
            .into_request(&self.client, base_url)?
            .bearer_auth(token);
        check_ok(execute(request).await?)
    }

    async fn workspace_id(&self, base_url: &str, token: &str) -> Result<String, BackendError> {
        let reply = self
            .send(PlannedRequest::post("auth.test"), base_url, token)
            .await?;
        reply_str(&reply, "team_id")
    }

    /// Three steps: reserve an upload URL, send the bytes to it, then share
    /// the file in the channel.
    async fn upload(
        &self,
        base_url: &str,
        token: &str,
        reserve: PlannedRequest,
        params: &Value,
    ) -> Result<Value, BackendError> {
        let ticket = self.send(reserve, base_url, token).await?;
        let upload_url = reply_str(&ticket, "upload_url")?;
        let file_id = reply_str(&ticket, "file_id")?;
        let content = required_str(params, "content")?.as_bytes().to_vec();
        execute(self.client.post(upload_url.as_str()).body(content)).await?;
        self.send(complete_upload(&file_id, params)?, base_url, token)
            .await
    }
}

/// Tools that need an admin user token instead of the bot token.
const USER_TOKEN_TOOLS: [&str; 6] = [
    "search_messages",
    "list_workspace_users",
    "set_user_admin",
    "deactivate_user",
    "archive_channel",
    "get_workspace_info",
];

/// Admin user calls that must name the workspace.
const WORKSPACE_SCOPED: [&str; 2] = ["set_user_admin", "deactivate_user"];

fn token_key(tool: &str) -> &'static str {
    if USER_TOKEN_TOOLS.contains(&tool) {
        "user_token"
    } else {
        "bot_token"
    }
}

pub fn plan(tool: &str, params: &Value) -> Result<PlannedRequest, BackendError> {
    let planned = match bare_tool(tool, "slack_") {
        "post_message" => {
            let mut body = object([
                ("channel", required_str(params, "channel_id")?),
                ("text", required_str(params, "text")?),
            ]);
            if let Some(thread_ts) = optional_str(params, "thread_ts") {
                body.insert("thread_ts".to_string(), json!(thread_ts));
            }
            PlannedRequest::post("chat.postMessage").body(Value::Object(body))
        }
        "update_message" => PlannedRequest::post("chat.update").body(Value::Object(object([
            ("channel", required_str(params, "channel_id")?),
            ("ts", required_str(params, "timestamp")?),
            ("text", required_str(params, "text")?),
        ]))),
        "delete_message" => PlannedRequest::post("chat.delete").body(Value::Object(object([
            ("channel", required_str(params, "channel_id")?),
            ("ts", required_str(params, "timestamp")?),
        ]))),
        "list_channels" => PlannedRequest::get("conversations.list")
            .query("limit", optional_u64(params, "limit", 100)?)
            .query(
                "types",
                optional_str(params, "types").unwrap_or("public_channel,private_channel"),
            ),
        "create_channel" => PlannedRequest::post("conversations.create").body(json!({
            "name": required_str(params, "name")?,
            "is_private": optional_bool(params, "is_private")?,
        })),
        "get_channel_history" => PlannedRequest::get("conversations.history")
            .query("channel", required_str(params, "channel_id")?)
            .query("limit", optional_u64(params, "limit", 20)?),
        "add_reaction" => PlannedRequest::post("reactions.add").body(Value::Object(object([
            ("channel", required_str(params, "channel_id")?),
            ("timestamp", required_str(params, "timestamp")?),
            ("name", required_str(params, "reaction")?),
        ]))),
        "get_user" => {
            PlannedRequest::get("users.info").query("user", required_str(params, "user_id")?)
        }
        "set_channel_topic" => {
            PlannedRequest::post("conversations.setTopic").body(Value::Object(object([
                ("channel", required_str(params, "channel_id")?),
                ("topic", required_str(params, "topic")?),
            ])))
        }
        "invite_to_channel" => PlannedRequest::post("conversations.invite").body(json!({
            "channel": required_str(params, "channel_id")?,
            "users": string_list(params, "user_ids")?.join(","),
        })),
        "get_thread_replies" => PlannedRequest::get("conversations.replies")
            .query("channel", required_str(params, "channel_id")?)
            .query("ts", required_str(params, "thread_ts")?),
        "search_messages" => PlannedRequest::get("search.messages")
            .query("query", required_str(params, "query")?)
            .query("count", optional_u64(params, "count", 20)?),
        "list_workspace_users" => {
            PlannedRequest::get("users.list").query("limit", optional_u64(params, "limit", 100)?)
        }
        "get_workspace_info" => PlannedRequest::get("team.info"),
        "archive_channel" => PlannedRequest::post("admin.conversations.archive")
            .body(json!({ "channel_id": required_str(params, "channel_id")? })),
        "set_user_admin" => {
            let route = if optional_bool(params, "is_admin")? {
                "admin.users.setAdmin"
            } else {
                "admin.users.setRegular"
            };
            PlannedRequest::post(route).body(json!({ "user_id": required_str(params, "user_id")? }))
        }
        "deactivate_user" => PlannedRequest::post("admin.users.remove")
            .body(json!({ "user_id": required_str(params, "user_id")? })),
        "upload_file" => {
            let content = required_str(params, "content")?;
            PlannedRequest::get("files.getUploadURLExternal")
                .query("filename", required_str(params, "filename")?)
                .query("length", content.len())
        }
        _ => return Err(unknown_tool(tool)),
    };
    Ok(planned)
}

fn complete_upload(file_id: &str, params: &Value) -> Result<PlannedRequest, BackendError> {
    let title = optional_str(params, "title").unwrap_or(required_str(params, "filename")?);
    let mut body = json!({
        "files": [{ "id": file_id, "title": title }],
        "channel_id": required_str(params, "channel_id")?,
    });
    if let Some(comment) = optional_str(params, "initial_comment") {
        body["initial_comment"] = json!(comment);
    }
    Ok(PlannedRequest::post("files.completeUploadExternal").body(body))
}

fn reply_str(reply: &Value, key: &str) -> Result<String, BackendError> {
    reply
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendError::Rejected {
            message: format!("reply is missing `{key}`"),
        })
}

/// Slack reports most failures as HTTP 200 with `ok: false`.
fn check_ok(reply: Value) -> Result<Value, BackendError> {
    if reply.get("ok").and_then(Value::as_bool) == Some(false) {
        let message = reply
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_string();
        return Err(BackendError::Rejected { message });
    }
    Ok(reply)
}

fn object<const N: usize>(fields: [(&str, &str); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), json!(value)))
        .collect()
}
