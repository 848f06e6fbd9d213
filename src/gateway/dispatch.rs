//! Protocol frame dispatcher for streaming sessions
//!
//! Frames arriving over a session's out-of-band channel are JSON-RPC
//! messages. Requests produce exactly one reply frame; notifications and
//! stray response frames produce none.

use serde_json::{Value, json};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::Error;
use crate::pipeline::InvocationPipeline;
use crate::protocol::{
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, ToolsCallResult, rpc_codes,
};

/// Dispatch one inbound frame, returning the reply frame if the message
/// warrants one.
pub async fn handle_frame(
    catalog: &Catalog,
    pipeline: &InvocationPipeline,
    frame: JsonRpcMessage,
) -> Option<JsonRpcResponse> {
    match frame {
        JsonRpcMessage::Request(request) => Some(handle_request(catalog, pipeline, request).await),
        JsonRpcMessage::Notification(notification) => {
            debug!(method = %notification.method, "Notification accepted");
            None
        }
        JsonRpcMessage::Response(_) => {
            debug!("Ignoring stray response frame");
            None
        }
    }
}

async fn handle_request(
    catalog: &Catalog,
    pipeline: &InvocationPipeline,
    request: JsonRpcRequest,
) -> JsonRpcResponse {
    let id = request.id;
    debug!(method = %request.method, id = %id, "Dispatching frame");

    match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "ping" => JsonRpcResponse::success(id, json!({})),

        "tools/list" => {
            JsonRpcResponse::success(id, json!({ "tools": catalog.tool_descriptors() }))
        }

        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INVALID_PARAMS,
                    "tools/call requires a 'name' parameter",
                );
            };
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match pipeline.invoke(name, arguments).await {
                Ok(value) => JsonRpcResponse::success(
                    id,
                    serde_json::to_value(ToolsCallResult::from_value(&value))
                        .unwrap_or(Value::Null),
                ),
                // Handler failures are tool results, not protocol errors.
                Err(Error::Handler(message)) => JsonRpcResponse::success(
                    id,
                    serde_json::to_value(ToolsCallResult::from_error(message))
                        .unwrap_or(Value::Null),
                ),
                Err(Error::UnknownTool(name)) => JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::METHOD_NOT_FOUND,
                    format!("Unknown tool: {name}"),
                ),
                Err(err @ Error::InvalidInput { .. }) => {
                    let violations = err.to_body()["error"]["violations"].clone();
                    JsonRpcResponse::error_with_data(
                        Some(id),
                        rpc_codes::INVALID_PARAMS,
                        err.to_string(),
                        json!({ "violations": violations }),
                    )
                }
                Err(other) => JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INTERNAL_ERROR,
                    other.to_string(),
                ),
            }
        }

        "resources/list" => {
            JsonRpcResponse::success(id, json!({ "resources": catalog.resource_descriptors() }))
        }

        "resources/read" => {
            let params = request.params.unwrap_or(Value::Null);
            let Some(uri) = params.get("uri").and_then(Value::as_str) else {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INVALID_PARAMS,
                    "resources/read requires a 'uri' parameter",
                );
            };

            let Some(resource) = catalog.resource(uri) else {
                return JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::RESOURCE_NOT_FOUND,
                    format!("Unknown resource: {uri}"),
                );
            };

            match resource.read().await {
                Ok(contents) => {
                    JsonRpcResponse::success(id, json!({ "contents": [contents] }))
                }
                Err(err) => JsonRpcResponse::error(
                    Some(id),
                    rpc_codes::INTERNAL_ERROR,
                    err.to_string(),
                ),
            }
        }

        other => JsonRpcResponse::error(
            Some(id),
            rpc_codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::Result;
    use crate::catalog::{ToolDefinition, ToolHandler};
    use crate::protocol::RequestId;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, args: Value) -> Result<Value> {
            Ok(json!({ "echo": args }))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _args: Value) -> Result<Value> {
            Err(Error::Handler("boom".to_string()))
        }
    }

    fn fixtures() -> (Arc<Catalog>, InvocationPipeline) {
        let tools = vec![
            ToolDefinition {
                name: "list_projects".to_string(),
                description: "list".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
                handler: Arc::new(EchoHandler),
            },
            ToolDefinition {
                name: "broken".to_string(),
                description: "fails".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
                handler: Arc::new(FailingHandler),
            },
        ];
        let catalog = Arc::new(Catalog::build(tools, Vec::new()).unwrap());
        let pipeline = InvocationPipeline::new(Arc::clone(&catalog));
        (catalog, pipeline)
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcMessage {
        JsonRpcMessage::Request(JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        })
    }

    #[tokio::test]
    async fn initialize_reports_identity() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(&catalog, &pipeline, request("initialize", None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn tools_list_enumerates_catalog() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(&catalog, &pipeline, request("tools/list", None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].clone();
        assert_eq!(tools.as_array().unwrap().len(), 2);
        assert_eq!(tools[0]["name"], "list_projects");
    }

    #[tokio::test]
    async fn tools_call_success_wraps_handler_value() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(
            &catalog,
            &pipeline,
            request("tools/call", Some(json!({ "name": "list_projects" }))),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn tools_call_handler_failure_is_tool_error_result() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(
            &catalog,
            &pipeline,
            request("tools/call", Some(json!({ "name": "broken" }))),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn tools_call_unknown_tool_is_rpc_error() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(
            &catalog,
            &pipeline,
            request("tools/call", Some(json!({ "name": "nope" }))),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_method_is_rpc_error() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(&catalog, &pipeline, request("prompts/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn notifications_produce_no_reply() {
        let (catalog, pipeline) = fixtures();
        let frame: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(handle_frame(&catalog, &pipeline, frame).await.is_none());
    }

    #[tokio::test]
    async fn resources_read_unknown_uri_is_not_found() {
        let (catalog, pipeline) = fixtures();
        let response = handle_frame(
            &catalog,
            &pipeline,
            request("resources/read", Some(json!({ "uri": "gateway://nope" }))),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, rpc_codes::RESOURCE_NOT_FOUND);
    }
}
