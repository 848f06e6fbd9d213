//! Static catalog of tools and resources
//!
//! Built once at process start from a fixed ordered list; immutable
//! afterwards. Construction fails fast on duplicate names so a misregistered
//! tool can never shadow another at dispatch time.

pub mod resources;
pub mod schema;
pub mod tools;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::{ResourceContents, ResourceDescriptor, ToolDescriptor};
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// The capability fulfilling a tool call: given validated input,
/// asynchronously produce a result value or fail. The gateway treats all
/// handlers through this one contract and never inspects tool-specific
/// logic.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Invoke the tool with validated, normalized input.
    async fn call(&self, args: Value) -> Result<Value>;
}

/// The capability producing a resource's content.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Read the resource.
    async fn read(&self) -> Result<String>;
}

/// A tool registered in the catalog
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Input JSON Schema
    pub input_schema: Value,
    /// Bound handler
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// Descriptor for catalog enumeration (handler internals omitted).
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

/// A resource registered in the catalog
pub struct ResourceDefinition {
    /// Unique resource name
    pub name: String,
    /// Resource URI
    pub uri: String,
    /// Human-readable description
    pub description: String,
    /// Media type of the content
    pub mime_type: String,
    /// Bound handler
    pub handler: Arc<dyn ResourceHandler>,
}

impl ResourceDefinition {
    /// Descriptor for catalog enumeration.
    #[must_use]
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: Some(self.description.clone()),
            mime_type: Some(self.mime_type.clone()),
        }
    }

    /// Read the resource and wrap it with its URI and media type.
    pub async fn read(&self) -> Result<ResourceContents> {
        let text = self.handler.read().await?;
        Ok(ResourceContents {
            uri: self.uri.clone(),
            mime_type: Some(self.mime_type.clone()),
            text,
        })
    }
}

/// Immutable registry of tool and resource definitions
pub struct Catalog {
    tools: Vec<ToolDefinition>,
    tools_by_name: HashMap<String, usize>,
    resources: Vec<ResourceDefinition>,
    resources_by_uri: HashMap<String, usize>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("tools", &self.tools.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

impl Catalog {
    /// Build a catalog from ordered definition lists.
    ///
    /// Fails with a startup error when two tools or two resources share a
    /// name/URI.
    pub fn build(tools: Vec<ToolDefinition>, resources: Vec<ResourceDefinition>) -> Result<Self> {
        let mut tools_by_name = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            if tools_by_name.insert(tool.name.clone(), idx).is_some() {
                return Err(Error::Startup(format!(
                    "duplicate tool name in catalog: {}",
                    tool.name
                )));
            }
        }

        let mut resources_by_uri = HashMap::with_capacity(resources.len());
        for (idx, resource) in resources.iter().enumerate() {
            if resources_by_uri.insert(resource.uri.clone(), idx).is_some() {
                return Err(Error::Startup(format!(
                    "duplicate resource URI in catalog: {}",
                    resource.uri
                )));
            }
        }

        Ok(Self {
            tools,
            tools_by_name,
            resources,
            resources_by_uri,
        })
    }

    /// Build the fixed catalog this gateway ships with.
    ///
    /// The catalog resource serves a snapshot of the tool descriptors; the
    /// catalog is immutable after construction, so the snapshot never goes
    /// stale.
    pub fn builtin(upstream: Arc<UpstreamClient>) -> Result<Self> {
        let tools = tools::definitions(&upstream);
        let snapshot: Vec<ToolDescriptor> = tools.iter().map(ToolDefinition::descriptor).collect();
        let resources = resources::definitions(snapshot);
        Self::build(tools, resources)
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools_by_name.get(name).map(|&idx| &self.tools[idx])
    }

    /// Look up a resource by URI.
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<&ResourceDefinition> {
        self.resources_by_uri
            .get(uri)
            .map(|&idx| &self.resources[idx])
    }

    /// Enumerate tool descriptors in registration order.
    #[must_use]
    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(ToolDefinition::descriptor).collect()
    }

    /// Enumerate resource descriptors in registration order.
    #[must_use]
    pub fn resource_descriptors(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .map(ResourceDefinition::descriptor)
            .collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}
