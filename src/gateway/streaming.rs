//! Streaming transport endpoint
//!
//! `GET /stream` opens a long-lived SSE connection. Establishment order
//! matters: the session and its channel are created, the transport's first
//! frame (the `endpoint` event announcing the out-of-band POST address) is
//! queued, and only then is the identifier inserted into the registry — all
//! without an intervening suspension point, so a lookup can never race an
//! incomplete connection.
//!
//! `POST /stream-post?sessionId=…` is the out-of-band surface. The frame is
//! dispatched inline and the reply (if any) queued to the session's channel,
//! preserving per-session arrival order.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::dispatch;
use super::router::AppState;
use crate::Error;
use crate::protocol::{JsonRpcMessage, JsonRpcResponse, rpc_codes};
use crate::session::{Outbound, Session, SessionRegistry};

/// Query parameters for the out-of-band message surface
#[derive(Debug, Deserialize)]
pub struct StreamPostParams {
    /// Target session identifier
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// GET /stream — open a streaming session.
pub async fn stream_handler(State(state): State<Arc<AppState>>) -> Response {
    let (session, rx) = Session::open(state.streaming.buffer_size);
    let address = format!("/stream-post?sessionId={}", session.id);

    // Queued before registration; the channel is fresh so this cannot fail
    // unless the buffer size is zero.
    if let Err(err) = session.try_deliver(Outbound::Endpoint { address }) {
        warn!(error = %err, "Failed to start streaming transport");
        return err.into_response();
    }
    state.sessions.insert(Arc::clone(&session));

    info!(session_id = %session.id, "Streaming session established");

    let stream = outbound_stream(Arc::clone(&state.sessions), session.id.clone(), rx);
    let keep_alive = Duration::from_secs(state.streaming.keep_alive_secs);

    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(keep_alive).text("ping"))
        .into_response();
    if let Ok(value) = session.id.parse() {
        response.headers_mut().insert("x-session-id", value);
    }
    response
}

/// The SSE frame source for one session.
///
/// Ends when the session's channel closes; dropping it (client disconnect)
/// removes the session from the registry so no further delivery is
/// attempted.
fn outbound_stream(
    registry: Arc<SessionRegistry>,
    session_id: String,
    mut rx: mpsc::Receiver<Outbound>,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> {
    stream! {
        let _guard = DisconnectGuard {
            registry,
            session_id,
        };

        while let Some(frame) = rx.recv().await {
            match frame {
                Outbound::Endpoint { address } => {
                    yield Ok(Event::default().event("endpoint").data(address));
                }
                Outbound::Message(response) => {
                    yield Ok(Event::default()
                        .event("message")
                        .data(serde_json::to_string(&response).unwrap_or_default()));
                }
            }
        }
    }
}

/// Removes the session when the transport goes away, however that happens.
struct DisconnectGuard {
    registry: Arc<SessionRegistry>,
    session_id: String,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.session_id);
    }
}

/// POST /stream-post — deliver an out-of-band message to a session.
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamPostParams>,
    body: String,
) -> Response {
    let session_id = match params.session_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Error::MissingSessionId.into_response(),
    };

    // Sessions are never created implicitly on this path.
    let Some(session) = state.sessions.get(&session_id) else {
        return Error::UnknownSession(session_id).into_response();
    };

    let frame: JsonRpcMessage = match serde_json::from_str(&body) {
        Ok(frame) => frame,
        Err(e) => {
            let response =
                JsonRpcResponse::error(None, rpc_codes::PARSE_ERROR, format!("Invalid frame: {e}"));
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(serde_json::to_value(response).unwrap_or_default()),
            )
                .into_response();
        }
    };

    if let Some(reply) = dispatch::handle_frame(&state.catalog, &state.pipeline, frame).await {
        if let Err(err) = session.deliver(Outbound::Message(reply)).await {
            // Write failure: the connection is gone. Close the session and
            // abandon anything still pending for it.
            warn!(session_id = %session_id, error = %err, "Write failed, closing session");
            state.sessions.remove(&session_id);
            return err.into_response();
        }
    }

    StatusCode::ACCEPTED.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn disconnect_removes_session_from_registry() {
        let registry = Arc::new(SessionRegistry::new());
        let (session, rx) = Session::open(8);
        session
            .try_deliver(Outbound::Endpoint {
                address: format!("/stream-post?sessionId={}", session.id),
            })
            .unwrap();
        registry.insert(Arc::clone(&session));
        assert!(registry.contains(&session.id));

        let mut stream = Box::pin(outbound_stream(
            Arc::clone(&registry),
            session.id.clone(),
            rx,
        ));

        // First frame is the endpoint announcement.
        assert!(stream.next().await.is_some());

        // Client disconnect drops the stream; the guard removes the session.
        drop(stream);
        assert!(!registry.contains(&session.id));
    }

    #[tokio::test]
    async fn stream_ends_when_channel_closes() {
        let registry = Arc::new(SessionRegistry::new());
        let (session, rx) = Session::open(8);
        registry.insert(Arc::clone(&session));
        let id = session.id.clone();

        let mut stream = Box::pin(outbound_stream(Arc::clone(&registry), id.clone(), rx));

        // Dropping every sender closes the channel and ends the stream.
        registry.remove(&id);
        drop(session);
        assert!(stream.next().await.is_none());
    }
}
