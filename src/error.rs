//! Error types for the gateway

use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, Error>;

/// A single input-validation violation, anchored to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path within the input object (empty for top-level issues).
    pub path: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Violation {
    /// Create a violation for the given field path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// No bearer credential supplied
    #[error("Missing bearer credential")]
    MissingCredential,

    /// Credential supplied but does not match the configured secret
    #[error("Invalid bearer credential")]
    InvalidCredential,

    /// Tool not present in the catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Resource not present in the catalog
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Streaming session identifier not registered
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Out-of-band message without a session identifier
    #[error("Missing sessionId parameter")]
    MissingSessionId,

    /// No route matched the request
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// Input failed schema validation
    #[error("Invalid input: {} violation(s)", violations.len())]
    InvalidInput {
        /// Field-path-indexed violations
        violations: Vec<Violation>,
    },

    /// Handler or upstream failure, message passed through verbatim
    #[error("{0}")]
    Handler(String),

    /// Transport or session establishment failure
    #[error("Setup error: {0}")]
    Setup(String),

    /// Fatal configuration problem; the process must not start
    #[error("Startup error: {0}")]
    Startup(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable error kind, used in response bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::UnknownTool(_) => "unknown_tool",
            Self::UnknownResource(_) => "unknown_resource",
            Self::UnknownSession(_) => "unknown_session",
            Self::MissingSessionId => "missing_session_id",
            Self::RouteNotFound(_) => "route_not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Handler(_) => "handler_error",
            Self::Setup(_) => "setup_error",
            Self::Startup(_) => "startup_error",
            Self::Io(_) | Self::Json(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential => StatusCode::UNAUTHORIZED,
            Self::InvalidCredential => StatusCode::FORBIDDEN,
            Self::UnknownTool(_)
            | Self::UnknownResource(_)
            | Self::UnknownSession(_)
            | Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingSessionId | Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Handler(_) | Self::Setup(_) | Self::Startup(_) | Self::Io(_) | Self::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured JSON body for this error.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::InvalidInput { violations } = self {
            if let Some(obj) = error.as_object_mut() {
                obj.insert(
                    "violations".to_string(),
                    serde_json::to_value(violations).unwrap_or_default(),
                );
            }
        }
        json!({ "error": error })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
