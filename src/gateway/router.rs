//! HTTP router and handlers
//!
//! One router hosts both transport bindings over the shared gateway core:
//! the synchronous request/response surface under `/api`, and the streaming
//! surface at `/stream` + `/stream-post`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use super::auth::{AuthGate, auth_middleware};
use super::streaming;
use crate::catalog::Catalog;
use crate::config::StreamingConfig;
use crate::pipeline::InvocationPipeline;
use crate::session::SessionRegistry;
use crate::{Error, Result};

/// Shared application state
pub struct AppState {
    /// Tool and resource catalog
    pub catalog: Arc<Catalog>,
    /// Invocation pipeline
    pub pipeline: InvocationPipeline,
    /// Live streaming sessions
    pub sessions: Arc<SessionRegistry>,
    /// Authentication gate
    pub auth: Arc<AuthGate>,
    /// Streaming configuration
    pub streaming: StreamingConfig,
    /// Process start time, reported by the status endpoint
    pub started_at: DateTime<Utc>,
}

/// Create the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let auth = Arc::clone(&state.auth);

    Router::new()
        .route("/", get(banner_handler))
        .route("/api/status", get(status_handler))
        .route("/api/tools", get(tools_handler))
        .route("/api/tools/{name}/execute", post(execute_handler))
        .route("/stream", get(streaming::stream_handler))
        .route("/stream-post", post(streaming::message_handler))
        .fallback(fallback_handler)
        // Authentication runs before any routing decision; CORS sits outside
        // it so preflight requests resolve without a credential.
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / — liveness banner, the one public path.
async fn banner_handler() -> impl IntoResponse {
    concat!("dbops-gateway v", env!("CARGO_PKG_VERSION"), "\n")
}

/// GET /api/status — gateway identity, version, time.
async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "time": Utc::now().to_rfc3339(),
        "started_at": state.started_at.to_rfc3339(),
        "tools": state.catalog.tool_count(),
        "sessions": state.sessions.len(),
    }))
}

/// GET /api/tools — catalog enumeration with input schemas.
async fn tools_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "tools": state.catalog.tool_descriptors() }))
}

/// POST /api/tools/{name}/execute — the synchronous binding.
///
/// One inbound call maps to exactly one pipeline execution and one reply;
/// no session is involved and concurrent calls interleave freely.
async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: String,
) -> Result<Json<Value>> {
    // An empty body means "no arguments"; anything else must parse.
    let input = if body.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&body).map_err(|e| Error::InvalidInput {
            violations: vec![crate::error::Violation::new(
                "",
                format!("request body must be valid JSON: {e}"),
            )],
        })?
    };

    let result = state.pipeline.invoke(&name, input).await?;
    Ok(Json(json!({ "result": result })))
}

/// Any unmatched route.
async fn fallback_handler(uri: Uri) -> Response {
    Error::RouteNotFound(uri.path().to_string()).into_response()
}

/// Panics reaching the outermost boundary become a generic 500 with a safe
/// body; details go to the operational log only.
fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| (*s).to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(detail = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": {
                "kind": "internal_error",
                "message": "internal server error"
            }
        })),
    )
        .into_response()
}
