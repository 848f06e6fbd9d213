//! Builtin tool definitions
//!
//! Every tool is pure glue: validated input in, one control-plane API call,
//! raw upstream JSON out. The gateway never interprets the payloads.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ToolDefinition, ToolHandler};
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// The fixed, ordered tool list this gateway exposes.
pub fn definitions(upstream: &Arc<UpstreamClient>) -> Vec<ToolDefinition> {
    vec![
        tool(
            "list_projects",
            "List all projects visible to the configured credential",
            json!({ "type": "object", "properties": {} }),
            ListProjects(Arc::clone(upstream)),
        ),
        tool(
            "create_project",
            "Create a new project",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Optional project name" }
                }
            }),
            CreateProject(Arc::clone(upstream)),
        ),
        tool(
            "delete_project",
            "Delete a project",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Project to delete" }
                },
                "required": ["project_id"]
            }),
            DeleteProject(Arc::clone(upstream)),
        ),
        tool(
            "describe_project",
            "Fetch a single project's details",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" }
                },
                "required": ["project_id"]
            }),
            DescribeProject(Arc::clone(upstream)),
        ),
        tool(
            "create_branch",
            "Create a branch within a project",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "branch_name": { "type": "string", "description": "Optional branch name" }
                },
                "required": ["project_id"]
            }),
            CreateBranch(Arc::clone(upstream)),
        ),
        tool(
            "delete_branch",
            "Delete a branch from a project",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "branch_id": { "type": "string" }
                },
                "required": ["project_id", "branch_id"]
            }),
            DeleteBranch(Arc::clone(upstream)),
        ),
        tool(
            "run_sql",
            "Execute a single SQL statement against a project database",
            json!({
                "type": "object",
                "properties": {
                    "sql": { "type": "string", "description": "The SQL statement to execute" },
                    "project_id": { "type": "string" },
                    "database": { "type": "string", "description": "Optional database name" }
                },
                "required": ["sql", "project_id"]
            }),
            RunSql(Arc::clone(upstream)),
        ),
        tool(
            "get_connection_string",
            "Fetch the connection URI for a project database",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "database": { "type": "string" }
                },
                "required": ["project_id"]
            }),
            GetConnectionString(Arc::clone(upstream)),
        ),
        tool(
            "get_database_tables",
            "List tables in a project database",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "database": { "type": "string" }
                },
                "required": ["project_id"]
            }),
            GetDatabaseTables(Arc::clone(upstream)),
        ),
        tool(
            "describe_table_schema",
            "Fetch the column schema of one table",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "table": { "type": "string" }
                },
                "required": ["project_id", "table"]
            }),
            DescribeTableSchema(Arc::clone(upstream)),
        ),
    ]
}

fn tool(
    name: &str,
    description: &str,
    input_schema: Value,
    handler: impl ToolHandler + 'static,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
        handler: Arc::new(handler),
    }
}

/// Extract a required string field from validated input.
///
/// The pipeline validates before invoking, so a miss here means the schema
/// and the handler disagree; surfaced as a handler failure rather than a
/// panic.
fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Handler(format!("handler expected string field '{key}'")))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

struct ListProjects(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for ListProjects {
    async fn call(&self, _args: Value) -> Result<Value> {
        self.0.list_projects().await
    }
}

struct CreateProject(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for CreateProject {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0.create_project(optional_str(&args, "name")).await
    }
}

struct DeleteProject(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for DeleteProject {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0.delete_project(required_str(&args, "project_id")?).await
    }
}

struct DescribeProject(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for DescribeProject {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .describe_project(required_str(&args, "project_id")?)
            .await
    }
}

struct CreateBranch(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for CreateBranch {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .create_branch(
                required_str(&args, "project_id")?,
                optional_str(&args, "branch_name"),
            )
            .await
    }
}

struct DeleteBranch(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for DeleteBranch {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .delete_branch(
                required_str(&args, "project_id")?,
                required_str(&args, "branch_id")?,
            )
            .await
    }
}

struct RunSql(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for RunSql {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .run_sql(
                required_str(&args, "project_id")?,
                optional_str(&args, "database"),
                required_str(&args, "sql")?,
            )
            .await
    }
}

struct GetConnectionString(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for GetConnectionString {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .connection_string(
                required_str(&args, "project_id")?,
                optional_str(&args, "database"),
            )
            .await
    }
}

struct GetDatabaseTables(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for GetDatabaseTables {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .list_tables(
                required_str(&args, "project_id")?,
                optional_str(&args, "database"),
            )
            .await
    }
}

struct DescribeTableSchema(Arc<UpstreamClient>);

#[async_trait]
impl ToolHandler for DescribeTableSchema {
    async fn call(&self, args: Value) -> Result<Value> {
        self.0
            .describe_table(
                required_str(&args, "project_id")?,
                required_str(&args, "table")?,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    fn upstream() -> Arc<UpstreamClient> {
        Arc::new(
            UpstreamClient::from_config(&UpstreamConfig {
                base_url: "https://control-plane.test/api/v1".to_string(),
                api_key: Some("key".to_string()),
                timeout_secs: 5,
            })
            .unwrap(),
        )
    }

    #[test]
    fn definitions_have_unique_names() {
        let defs = definitions(&upstream());
        let mut names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn run_sql_schema_requires_sql_and_project() {
        let defs = definitions(&upstream());
        let run_sql = defs.iter().find(|d| d.name == "run_sql").unwrap();
        let required = run_sql.input_schema["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("sql")));
        assert!(required.contains(&serde_json::json!("project_id")));
    }

    #[test]
    fn required_str_reports_missing_field() {
        let err = required_str(&serde_json::json!({}), "project_id").unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
