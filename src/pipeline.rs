//! Validate-dispatch-respond pipeline
//!
//! One entry point, `invoke`: look the tool up, validate the raw input
//! against its schema, run the handler, normalize the outcome. The pipeline
//! owns no mutable state; concurrent invocations are fully independent and
//! never serialized against each other. Failures are never retried.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::catalog::{Catalog, schema};
use crate::{Error, Result};

/// The invocation pipeline shared by both transport bindings
#[derive(Clone)]
pub struct InvocationPipeline {
    catalog: Arc<Catalog>,
}

impl InvocationPipeline {
    /// Create a pipeline over the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Invoke `tool_name` with `raw_input`.
    ///
    /// Fails with `UnknownTool` when the name is not in the catalog,
    /// `InvalidInput` (with field-level violations) when the input does not
    /// match the tool's schema, and `HandlerError` when the handler itself
    /// fails; handler failure messages pass through verbatim.
    pub async fn invoke(&self, tool_name: &str, raw_input: Value) -> Result<Value> {
        let tool = self
            .catalog
            .tool(tool_name)
            .ok_or_else(|| Error::UnknownTool(tool_name.to_string()))?;

        let normalized = schema::validate_arguments(&raw_input, &tool.input_schema)
            .map_err(|violations| Error::InvalidInput { violations })?;

        debug!(tool = %tool_name, "Invoking handler");

        match tool.handler.call(normalized).await {
            Ok(value) => Ok(value),
            // Handler failures keep their message; everything else a handler
            // returns is folded into the same bucket without inspecting the
            // cause.
            Err(Error::Handler(message)) => Err(Error::Handler(message)),
            Err(other) => Err(Error::Handler(other.to_string())),
        }
    }
}
