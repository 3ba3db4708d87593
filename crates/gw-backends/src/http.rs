use gw_core::backend::BackendError;
use gw_core::types::Server;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

pub fn build_client(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| BackendError::Transport {
            message: err.to_string(),
        })
}

/// One backend HTTP call, resolved from a tool name and its parameters
/// before any credentials are attached.
///
/// The route is built from path segments. Fixed segments come from string
/// literals; caller-supplied ones go through [`PlannedRequest::segment`] and
/// are percent-encoded when the URL is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    pub method: Method,
    segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub raw_body: Option<RawBody>,
}

/// Non-JSON request body, sent as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBody {
    pub content_type: String,
    pub data: Vec<u8>,
}

impl PlannedRequest {
    pub fn new(method: Method, route: &'static str) -> Self {
        Self {
            method,
            segments: route
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            raw_body: None,
        }
    }

    pub fn get(route: &'static str) -> Self {
        Self::new(Method::GET, route)
    }

    pub fn post(route: &'static str) -> Self {
        Self::new(Method::POST, route)
    }

    /// Appends one caller-supplied path segment.
    pub fn segment(mut self, value: &str) -> Result<Self, BackendError> {
        check_segment(value)?;
        self.segments.push(value.to_string());
        Ok(self)
    }

    /// Appends a caller-supplied relative path such as `orders/new`. Each
    /// piece is checked like [`PlannedRequest::segment`].
    pub fn segments(mut self, path: &str) -> Result<Self, BackendError> {
        let mut pushed = false;
        for part in path.split('/').filter(|part| !part.is_empty()) {
            self = self.segment(part)?;
            pushed = true;
        }
        if !pushed {
            return Err(invalid_segment(path));
        }
        Ok(self)
    }

    /// The route relative to the base URL, unencoded.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn raw_body(mut self, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.raw_body = Some(RawBody {
            content_type: content_type.into(),
            data,
        });
        self
    }

    pub fn url(&self, base_url: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(base_url).map_err(|err| BackendError::InvalidConfig {
            message: format!("base url `{base_url}`: {err}"),
        })?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidConfig {
                message: format!("base url `{base_url}` cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }

    pub fn into_request(
        self,
        client: &Client,
        base_url: &str,
    ) -> Result<RequestBuilder, BackendError> {
        let url = self.url(base_url)?;
        let mut request = client.request(self.method, url);
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        for (name, value) in self.headers {
            request = request.header(name, value);
        }
        if let Some(body) = self.body {
            request = request.json(&body);
        } else if let Some(raw) = self.raw_body {
            request = request
                .header(CONTENT_TYPE, raw.content_type)
                .body(raw.data);
        }
        Ok(request)
    }
}

fn check_segment(value: &str) -> Result<(), BackendError> {
    let forbidden = |c: char| matches!(c, '/' | '\\' | '?' | '#') || c.is_control();
    if value.trim().is_empty() || value == "." || value == ".." || value.contains(forbidden) {
        return Err(invalid_segment(value));
    }
    Ok(())
}

fn invalid_segment(value: &str) -> BackendError {
    BackendError::InvalidParams {
        message: format!("`{value}` is not a valid path segment"),
    }
}

/// Sends `request` and decodes the reply. Empty bodies read as `null` and
/// non-JSON bodies are passed through as a string.
pub async fn execute(request: RequestBuilder) -> Result<Value, BackendError> {
    let response = request.send().await.map_err(|err| BackendError::Transport {
        message: err.to_string(),
    })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| BackendError::Transport {
            message: err.to_string(),
        })?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: truncate(body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}

pub fn config_value<'a>(server: &'a Server, key: &'static str) -> Result<&'a str, BackendError> {
    server
        .config_str(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(BackendError::MissingConfig { key })
}

/// Accepts both `post_message` and `slack_post_message`.
pub fn bare_tool<'a>(tool: &'a str, prefix: &str) -> &'a str {
    tool.strip_prefix(prefix).unwrap_or(tool)
}

pub fn unknown_tool(tool: &str) -> BackendError {
    BackendError::UnknownTool {
        tool: tool.to_string(),
    }
}

pub fn optional_u64(params: &Value, key: &str, default: u64) -> Result<u64, BackendError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value.as_u64().ok_or_else(|| BackendError::InvalidParams {
            message: format!("parameter `{key}` must be a non-negative integer"),
        }),
    }
}

pub fn optional_bool(params: &Value, key: &str) -> Result<bool, BackendError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| BackendError::InvalidParams {
            message: format!("parameter `{key}` must be a boolean"),
        }),
    }
}

/// Reads a required JSON object or array parameter.
pub fn required_json<'a>(
    params: &'a Value,
    key: &str,
    expected: JsonShape,
) -> Result<&'a Value, BackendError> {
    match params.get(key) {
        Some(value @ Value::Object(_)) if expected != JsonShape::Array => Ok(value),
        Some(value @ Value::Array(_)) if expected != JsonShape::Object => Ok(value),
        _ => Err(BackendError::InvalidParams {
            message: format!("parameter `{key}` must be {}", expected.describe()),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
    ObjectOrArray,
}

impl JsonShape {
    fn describe(self) -> &'static str {
        match self {
            Self::Object => "an object",
            Self::Array => "an array",
            Self::ObjectOrArray => "an object or array",
        }
    }
}

/// Reads a required non-empty list of strings.
pub fn string_list(params: &Value, key: &str) -> Result<Vec<String>, BackendError> {
    let invalid = || BackendError::InvalidParams {
        message: format!("parameter `{key}` must be a non-empty list of strings"),
    };
    let items = params.get(key).and_then(Value::as_array).ok_or_else(invalid)?;
    let values: Vec<String> = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;
    if values.is_empty() {
        return Err(invalid());
    }
    Ok(values)
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
