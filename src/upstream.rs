//! Control-plane API client
//!
//! Thin typed wrapper over the upstream database-management API. Each method
//! maps to exactly one HTTP call; failures are surfaced verbatim to the
//! caller and never retried.
//!
//! Credentials are injected at request time and never logged or echoed in
//! error messages.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::{Error, Result};

/// Client for the upstream control-plane API
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl UpstreamClient {
    /// Build a client from configuration.
    ///
    /// Fails when the base URL does not parse or the credential is absent;
    /// both are startup-time conditions.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        // Url::join treats the last path segment as a file unless the base
        // ends with a slash.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Startup(format!("invalid upstream base URL: {e}")))?;

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Startup("upstream API key is not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Startup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Issue one request against the control plane and decode the JSON body.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Handler(format!("invalid upstream path '{path}': {e}")))?;

        debug!(method = %method, path = %path, "Upstream request");

        let mut request = self.client.request(method, url).bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Handler(format!("upstream request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Handler(format!("failed to read upstream response: {e}")))?;

        if !status.is_success() {
            return Err(Error::Handler(format!("upstream returned {status}: {text}")));
        }

        if status == StatusCode::NO_CONTENT || text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Handler(format!("upstream returned invalid JSON: {e}")))
    }

    /// List all projects visible to the configured credential.
    pub async fn list_projects(&self) -> Result<Value> {
        self.request(Method::GET, "projects", None).await
    }

    /// Create a project, optionally named.
    pub async fn create_project(&self, name: Option<&str>) -> Result<Value> {
        let body = name.map(|n| json!({ "project": { "name": n } }));
        self.request(Method::POST, "projects", body).await
    }

    /// Delete a project.
    pub async fn delete_project(&self, project_id: &str) -> Result<Value> {
        self.request(Method::DELETE, &format!("projects/{project_id}"), None)
            .await
    }

    /// Fetch a single project's details.
    pub async fn describe_project(&self, project_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("projects/{project_id}"), None)
            .await
    }

    /// Create a branch within a project.
    pub async fn create_branch(&self, project_id: &str, branch_name: Option<&str>) -> Result<Value> {
        let body = branch_name.map(|n| json!({ "branch": { "name": n } }));
        self.request(Method::POST, &format!("projects/{project_id}/branches"), body)
            .await
    }

    /// Delete a branch.
    pub async fn delete_branch(&self, project_id: &str, branch_id: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("projects/{project_id}/branches/{branch_id}"),
            None,
        )
        .await
    }

    /// Execute a SQL statement against a project database.
    pub async fn run_sql(&self, project_id: &str, database: Option<&str>, sql: &str) -> Result<Value> {
        let mut body = json!({ "sql": sql });
        if let Some(db) = database {
            body["database"] = json!(db);
        }
        self.request(Method::POST, &format!("projects/{project_id}/query"), Some(body))
            .await
    }

    /// Fetch the connection URI for a project database.
    pub async fn connection_string(&self, project_id: &str, database: Option<&str>) -> Result<Value> {
        let path = match database {
            Some(db) => format!("projects/{project_id}/connection_uri?database={db}"),
            None => format!("projects/{project_id}/connection_uri"),
        };
        self.request(Method::GET, &path, None).await
    }

    /// List tables in a project database.
    pub async fn list_tables(&self, project_id: &str, database: Option<&str>) -> Result<Value> {
        let path = match database {
            Some(db) => format!("projects/{project_id}/tables?database={db}"),
            None => format!("projects/{project_id}/tables"),
        };
        self.request(Method::GET, &path, None).await
    }

    /// Fetch the column schema of one table.
    pub async fn describe_table(&self, project_id: &str, table: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("projects/{project_id}/tables/{table}/schema"),
            None,
        )
        .await
    }
}
