//! Supabase PostgREST, storage and auth admin endpoints.

use crate::http::{
    JsonShape, PlannedRequest, bare_tool, config_value, execute, optional_bool, optional_u64,
    required_json, unknown_tool,
};
use async_trait::async_trait;
use gw_core::backend::{Backend, BackendError, optional_str, required_str};
use gw_core::types::{Server, ServerKind};
use reqwest::{Client, Method};
use serde_json::{Map, Value, json};

pub struct StoreBackend {
    client: Client,
}

impl StoreBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for StoreBackend {
    fn kind(&self) -> ServerKind {
        ServerKind::Store
    }

    async fn call(
        &self,
        server: &Server,
        tool: &str,
        params: &Value,
    ) -> Result<Value, BackendError> {
        let planned = plan(tool, params)?;
        let url = config_value(server, "url")?;
        let service_key = config_value(server, "service_key")?;
        let request = planned
            .header("apikey", service_key)
            .into_request(&self.client, url)?
            .bearer_auth(service_key);
        execute(request).await
    }
}

pub fn plan(tool: &str, params: &Value) -> Result<PlannedRequest, BackendError> {
    let planned = match bare_tool(tool, "supabase_") {
        "run_query" => exec_sql(required_str(params, "query")?.to_string()),
        "list_tables" => {
            let schema = optional_str(params, "schema_name").unwrap_or("public");
            exec_sql(format!(
                "SELECT table_name FROM information_schema.tables WHERE table_schema = {} ORDER BY table_name;",
                quote_literal(schema)
            ))
        }
        "select" => {
            let planned = table_request(Method::GET, params)?
                .query("select", optional_str(params, "columns").unwrap_or("*"))
                .query("limit", optional_u64(params, "limit", 100)?);
            with_filters(planned, filters(params)?)
        }
        "insert" => table_request(Method::POST, params)?
            .header("Prefer", "return=representation")
            .body(row_data(params)?),
        "update" => {
            let planned = table_request(Method::PATCH, params)?
                .header("Prefer", "return=representation")
                .body(row_data(params)?);
            with_filters(planned, required_filters(params)?)
        }
        "delete" => {
            let planned = table_request(Method::DELETE, params)?
                .header("Prefer", "return=representation");
            with_filters(planned, required_filters(params)?)
        }
        "list_buckets" => PlannedRequest::get("storage/v1/bucket"),
        "create_bucket" => {
            let name = required_str(params, "name")?;
            PlannedRequest::post("storage/v1/bucket").body(json!({
                "id": name,
                "name": name,
                "public": optional_bool(params, "public")?,
            }))
        }
        "list_files" => PlannedRequest::post("storage/v1/object/list")
            .segment(required_str(params, "bucket")?)?
            .body(json!({
                "prefix": optional_str(params, "path").unwrap_or(""),
                "limit": optional_u64(params, "limit", 100)?,
            })),
        "upload_file" => {
            let content = required_str(params, "content")?;
            let content_type =
                optional_str(params, "content_type").unwrap_or("application/octet-stream");
            let mut planned = PlannedRequest::post("storage/v1/object")
                .segment(required_str(params, "bucket")?)?
                .segments(required_str(params, "path")?)?
                .raw_body(content_type, content.as_bytes().to_vec());
            if optional_bool(params, "upsert")? {
                planned = planned.header("x-upsert", "true");
            }
            planned
        }
        "delete_file" => PlannedRequest::new(Method::DELETE, "storage/v1/object")
            .segment(required_str(params, "bucket")?)?
            .body(json!({ "prefixes": [required_str(params, "path")?] })),
        "list_users" => PlannedRequest::get("auth/v1/admin/users")
            .query("page", optional_u64(params, "page", 1)?)
            .query("per_page", optional_u64(params, "per_page", 50)?),
        "get_user" => PlannedRequest::get("auth/v1/admin/users")
            .segment(required_str(params, "user_id")?)?,
        "create_user" => PlannedRequest::post("auth/v1/admin/users").body(json!({
            "email": required_str(params, "email")?,
            "password": required_str(params, "password")?,
            "email_confirm": optional_bool(params, "email_confirm")?,
        })),
        "enable_rls" => exec_sql(format!(
            "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;",
            qualified_table(params)?
        )),
        "create_rls_policy" => exec_sql(rls_policy(params)?),
        _ => return Err(unknown_tool(tool)),
    };
    Ok(planned)
}

/// Raw SQL runs through the project's `exec_sql` database function.
fn exec_sql(query: String) -> PlannedRequest {
    PlannedRequest::post("rest/v1/rpc/exec_sql").body(json!({ "query": query }))
}

fn rls_policy(params: &Value) -> Result<String, BackendError> {
    let command = required_str(params, "command")?.to_ascii_uppercase();
    if !matches!(command.as_str(), "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "ALL") {
        return Err(BackendError::InvalidParams {
            message: format!("unsupported policy command `{command}`"),
        });
    }
    let mut sql = format!(
        "CREATE POLICY {} ON {} FOR {command} USING ({})",
        quote_ident(required_str(params, "policy_name")?),
        qualified_table(params)?,
        required_str(params, "definition")?,
    );
    if let Some(check) = optional_str(params, "check").filter(|check| !check.trim().is_empty()) {
        sql.push_str(&format!(" WITH CHECK ({check})"));
    }
    sql.push(';');
    Ok(sql)
}

fn qualified_table(params: &Value) -> Result<String, BackendError> {
    let schema = optional_str(params, "schema_name").unwrap_or("public");
    Ok(format!(
        "{}.{}",
        quote_ident(schema),
        quote_ident(required_str(params, "table")?)
    ))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn table_request(method: Method, params: &Value) -> Result<PlannedRequest, BackendError> {
    PlannedRequest::new(method, "rest/v1").segment(required_str(params, "table")?)
}

fn row_data(params: &Value) -> Result<Value, BackendError> {
    required_json(params, "data", JsonShape::ObjectOrArray).cloned()
}

fn filters(params: &Value) -> Result<Map<String, Value>, BackendError> {
    match params.get("filters") {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(BackendError::InvalidParams {
            message: "parameter `filters` must be an object".to_string(),
        }),
    }
}

/// Updates and deletes without a filter would touch every row.
fn required_filters(params: &Value) -> Result<Map<String, Value>, BackendError> {
    let filters = filters(params)?;
    if filters.is_empty() {
        return Err(BackendError::InvalidParams {
            message: "parameter `filters` must not be empty".to_string(),
        });
    }
    Ok(filters)
}

fn with_filters(mut planned: PlannedRequest, filters: Map<String, Value>) -> PlannedRequest {
    for (column, value) in filters {
        let value = match value {
            Value::String(text) => text,
            other => other.to_string(),
        };
        planned = planned.query(&column, format!("eq.{value}"));
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_builds_postgrest_query() {
        let planned = plan(
            "supabase_select",
            &json!({"table": "orders", "columns": "id,total", "filters": {"status": "paid", "user_id": 9}, "limit": 5}),
        )
        .unwrap();
        assert_eq!(planned.method, Method::GET);
        assert_eq!(planned.path(), "rest/v1/orders");
        assert_eq!(
            planned.query,
            vec![
                ("select".to_string(), "id,total".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("status".to_string(), "eq.paid".to_string()),
                ("user_id".to_string(), "eq.9".to_string()),
            ]
        );
    }

    #[test]
    fn writes_require_data_and_filters() {
        assert!(matches!(
            plan("insert", &json!({"table": "orders", "data": "x"})),
            Err(BackendError::InvalidParams { .. })
        ));
        assert!(matches!(
            plan("delete", &json!({"table": "orders"})),
            Err(BackendError::InvalidParams { .. })
        ));
        let planned = plan(
            "update",
            &json!({"table": "orders", "data": {"status": "shipped"}, "filters": {"id": 1}}),
        )
        .unwrap();
        assert_eq!(planned.method, Method::PATCH);
        assert_eq!(planned.body, Some(json!({"status": "shipped"})));
        assert_eq!(planned.query, vec![("id".to_string(), "eq.1".to_string())]);
    }

    #[test]
    fn table_and_bucket_names_stay_single_segments() {
        for table in ["../rpc/exec_sql", "orders?select=*", ".."] {
            assert!(matches!(
                plan("select", &json!({"table": table})),
                Err(BackendError::InvalidParams { .. })
            ));
        }
        assert!(plan("list_files", &json!({"bucket": "../bucket"})).is_err());
        assert!(plan("delete_file", &json!({"bucket": "a/b", "path": "x"})).is_err());
        assert!(
            plan(
                "upload_file",
                &json!({"bucket": "docs", "path": "../../auth/v1/admin/users", "content": "x"})
            )
            .is_err()
        );
    }

    #[test]
    fn storage_paths() {
        let planned = plan("list_files", &json!({"bucket": "avatars"})).unwrap();
        assert_eq!(planned.path(), "storage/v1/object/list/avatars");
        assert_eq!(planned.body, Some(json!({"prefix": "", "limit": 100})));

        let planned = plan("create_bucket", &json!({"name": "docs", "public": true})).unwrap();
        assert_eq!(planned.path(), "storage/v1/bucket");
        assert_eq!(planned.body, Some(json!({"id": "docs", "name": "docs", "public": true})));

        let planned = plan(
            "upload_file",
            &json!({"bucket": "docs", "path": "team/notes.txt", "content": "hello", "content_type": "text/plain", "upsert": true}),
        )
        .unwrap();
        assert_eq!(planned.path(), "storage/v1/object/docs/team/notes.txt");
        assert_eq!(planned.headers, vec![("x-upsert", "true".to_string())]);
        let raw = planned.raw_body.unwrap();
        assert_eq!(raw.content_type, "text/plain");
        assert_eq!(raw.data, b"hello");

        let planned = plan("delete_file", &json!({"bucket": "docs", "path": "team/notes.txt"})).unwrap();
        assert_eq!(planned.method, Method::DELETE);
        assert_eq!(planned.path(), "storage/v1/object/docs");
        assert_eq!(planned.body, Some(json!({"prefixes": ["team/notes.txt"]})));
    }

    #[test]
    fn auth_admin_paths() {
        assert_eq!(plan("list_users", &json!({})).unwrap().path(), "auth/v1/admin/users");
        assert_eq!(
            plan("get_user", &json!({"user_id": "u-1"})).unwrap().path(),
            "auth/v1/admin/users/u-1"
        );
        let planned = plan(
            "create_user",
            &json!({"email": "a@example.com", "password": "pw"}),
        )
        .unwrap();
        assert_eq!(planned.method, Method::POST);
        assert_eq!(
            planned.body,
            Some(json!({"email": "a@example.com", "password": "pw", "email_confirm": false}))
        );
    }

    #[test]
    fn sql_tools_call_exec_sql() {
        let planned = plan("run_query", &json!({"query": "select 1"})).unwrap();
        assert_eq!(planned.path(), "rest/v1/rpc/exec_sql");
        assert_eq!(planned.body, Some(json!({"query": "select 1"})));

        let planned = plan("list_tables", &json!({"schema_name": "it's"})).unwrap();
        let query = planned.body.unwrap()["query"].as_str().unwrap().to_string();
        assert!(query.contains("table_schema = 'it''s'"));

        let planned = plan("enable_rls", &json!({"table": "orders"})).unwrap();
        assert_eq!(
            planned.body,
            Some(json!({"query": "ALTER TABLE \"public\".\"orders\" ENABLE ROW LEVEL SECURITY;"}))
        );
    }

    #[test]
    fn rls_policy_sql() {
        let planned = plan(
            "create_rls_policy",
            &json!({
                "table": "orders",
                "policy_name": "own rows",
                "command": "select",
                "definition": "auth.uid() = user_id",
            }),
        )
        .unwrap();
        assert_eq!(
            planned.body,
            Some(json!({"query": "CREATE POLICY \"own rows\" ON \"public\".\"orders\" FOR SELECT USING (auth.uid() = user_id);"}))
        );

        let planned = plan(
            "create_rls_policy",
            &json!({
                "table": "orders",
                "policy_name": "insert own",
                "command": "INSERT",
                "definition": "true",
                "check": "auth.uid() = user_id",
            }),
        )
        .unwrap();
        let query = planned.body.unwrap()["query"].as_str().unwrap().to_string();
        assert!(query.ends_with("USING (true) WITH CHECK (auth.uid() = user_id);"));

        assert!(matches!(
            plan(
                "create_rls_policy",
                &json!({"table": "t", "policy_name": "p", "command": "DROP", "definition": "true"})
            ),
            Err(BackendError::InvalidParams { .. })
        ));
    }
}
