//! One-time desktop client registration
//!
//! Merges an entry for this gateway into a desktop client's JSON
//! configuration file so the client knows where to open the streaming
//! connection. Read-modify-write: unrelated keys in an existing file are
//! preserved, and re-registering the same name overwrites only that entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::info;

use crate::{Error, Result};

/// Key under which clients keep their server registrations
const SERVERS_KEY: &str = "mcpServers";

/// Default location of the desktop client's configuration file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Claude").join("claude_desktop_config.json"))
}

/// Register the gateway under `name`, pointing the client at `stream_url`.
///
/// Creates the file (and parent directories) when absent.
pub fn register(config_path: &Path, name: &str, stream_url: &str) -> Result<()> {
    let mut config: Value = if config_path.exists() {
        let text = fs::read_to_string(config_path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Setup(format!("existing client config is not valid JSON: {e}")))?
    } else {
        json!({})
    };

    let Some(root) = config.as_object_mut() else {
        return Err(Error::Setup(
            "existing client config is not a JSON object".to_string(),
        ));
    };

    let servers = root
        .entry(SERVERS_KEY)
        .or_insert_with(|| json!({}));
    let Some(servers) = servers.as_object_mut() else {
        return Err(Error::Setup(format!(
            "'{SERVERS_KEY}' in the client config is not a JSON object"
        )));
    };

    servers.insert(name.to_string(), json!({ "url": stream_url }));

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, serde_json::to_string_pretty(&config)?)?;

    info!(path = %config_path.display(), name = %name, "Registered gateway with desktop client");
    Ok(())
}
