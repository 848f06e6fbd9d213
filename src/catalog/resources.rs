//! Builtin resource definitions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::{ResourceDefinition, ResourceHandler};
use crate::Result;
use crate::protocol::{PROTOCOL_VERSION, ToolDescriptor};

/// The fixed resource list this gateway exposes.
///
/// `tool_snapshot` is the descriptor list of the tools registered alongside
/// these resources; the catalog is immutable so the snapshot stays accurate
/// for the process lifetime.
pub fn definitions(tool_snapshot: Vec<ToolDescriptor>) -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            name: "gateway-status".to_string(),
            uri: "gateway://status".to_string(),
            description: "Gateway identity, version and current time".to_string(),
            mime_type: "application/json".to_string(),
            handler: Arc::new(StatusResource),
        },
        ResourceDefinition {
            name: "gateway-catalog".to_string(),
            uri: "gateway://catalog".to_string(),
            description: "The tool catalog with input schemas".to_string(),
            mime_type: "application/json".to_string(),
            handler: Arc::new(CatalogResource {
                tools: tool_snapshot,
            }),
        },
    ]
}

struct StatusResource;

#[async_trait]
impl ResourceHandler for StatusResource {
    async fn read(&self) -> Result<String> {
        let status = json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "protocolVersion": PROTOCOL_VERSION,
            "time": Utc::now().to_rfc3339(),
        });
        Ok(status.to_string())
    }
}

struct CatalogResource {
    tools: Vec<ToolDescriptor>,
}

#[async_trait]
impl ResourceHandler for CatalogResource {
    async fn read(&self) -> Result<String> {
        Ok(json!({ "tools": self.tools }).to_string())
    }
}
