//! Streaming session registry
//!
//! Tracks live streaming sessions keyed by identifier. The map is the only
//! process-wide mutable state in the gateway; it is encapsulated here behind
//! explicit insert/remove operations, and guarded by a synchronous lock so
//! no suspension point can interleave a single mutation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::JsonRpcResponse;
use crate::{Error, Result};

/// A frame queued for delivery over a session's streaming connection
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Transport announcement: the address for out-of-band messages,
    /// embedding the session identifier. Always the first frame sent.
    Endpoint {
        /// Relative POST address for this session
        address: String,
    },
    /// A protocol reply
    Message(JsonRpcResponse),
}

/// One live streaming session
#[derive(Debug)]
pub struct Session {
    /// Opaque, globally unique identifier, generated at connection
    /// establishment
    pub id: String,
    /// When the connection was accepted
    pub created_at: DateTime<Utc>,
    /// Outbound frame queue, consumed by the SSE stream
    tx: mpsc::Sender<Outbound>,
}

impl Session {
    /// Create a session with a fresh identifier and its outbound channel.
    ///
    /// The receiver half becomes the transport's frame source; the session
    /// is not visible to lookups until inserted into the registry.
    #[must_use]
    pub fn open(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(buffer);
        let session = Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            tx,
        });
        (session, rx)
    }

    /// Queue a frame without suspending.
    ///
    /// Used for the endpoint announcement before the session is registered;
    /// the channel is freshly created then, so the queue cannot be full.
    pub fn try_deliver(&self, frame: Outbound) -> Result<()> {
        self.tx
            .try_send(frame)
            .map_err(|e| Error::Setup(format!("session {} channel rejected frame: {e}", self.id)))
    }

    /// Queue a frame for delivery, waiting for buffer space if needed.
    ///
    /// Fails once the receiving transport has gone away; the caller is
    /// expected to close the session on failure.
    pub async fn deliver(&self, frame: Outbound) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| Error::Setup(format!("session {} connection is closed", self.id)))
    }
}

/// Registry of live sessions, keyed by identifier
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a started session.
    pub fn insert(&self, session: Arc<Session>) {
        let id = session.id.clone();
        self.sessions.write().insert(id.clone(), session);
        info!(session_id = %id, "Session registered");
    }

    /// Look up a live session.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session. Idempotent: removing an already-closed session is
    /// a no-op, and the identifier is removed at most once.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session closed");
        } else {
            debug!(session_id = %id, "Session already closed");
        }
        removed
    }

    /// Whether a session is currently registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;

    #[tokio::test]
    async fn sessions_get_distinct_identifiers() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = Session::open(8);
        let (b, _rx_b) = Session::open(8);
        assert_ne!(a.id, b.id);

        registry.insert(Arc::clone(&a));
        registry.insert(Arc::clone(&b));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&a.id));
        assert!(registry.contains(&b.id));
    }

    #[tokio::test]
    async fn removing_one_session_leaves_the_other() {
        let registry = SessionRegistry::new();
        let (a, _rx_a) = Session::open(8);
        let (b, _rx_b) = Session::open(8);
        registry.insert(Arc::clone(&a));
        registry.insert(Arc::clone(&b));

        assert!(registry.remove(&a.id));
        assert!(!registry.contains(&a.id));
        assert!(registry.contains(&b.id));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let (session, _rx) = Session::open(8);
        registry.insert(Arc::clone(&session));

        assert!(registry.remove(&session.id));
        assert!(!registry.remove(&session.id));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let registry = SessionRegistry::new();
        assert!(registry.get("nope").is_none());
        assert!(!registry.contains("nope"));
    }

    #[tokio::test]
    async fn frames_are_delivered_in_order() {
        let (session, mut rx) = Session::open(8);

        for i in 0..3_i64 {
            session
                .deliver(Outbound::Message(JsonRpcResponse::success(
                    RequestId::Number(i),
                    serde_json::json!(i),
                )))
                .await
                .unwrap();
        }

        for i in 0..3_i64 {
            let Some(Outbound::Message(response)) = rx.recv().await else {
                panic!("expected message frame");
            };
            assert_eq!(response.id, Some(RequestId::Number(i)));
        }
    }

    #[tokio::test]
    async fn delivery_fails_after_transport_is_gone() {
        let (session, rx) = Session::open(8);
        drop(rx);

        let err = session
            .deliver(Outbound::Message(JsonRpcResponse::success(
                RequestId::Number(1),
                serde_json::json!({}),
            )))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Setup(_)));
    }
}
