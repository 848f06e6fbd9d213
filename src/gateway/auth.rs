//! Authentication gate
//!
//! Every inbound request passes here before routing. The gate holds exactly
//! one secret, read at startup; a request is accepted if and only if it
//! carries that secret as a bearer credential. "No credential" and "wrong
//! credential" are distinct outcomes (401 vs 403).

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::{Error, Result};

/// Paths served without a credential
const PUBLIC_PATHS: &[&str] = &["/"];

/// The authentication gate
pub struct AuthGate {
    secret: String,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl AuthGate {
    /// Build the gate from configuration.
    ///
    /// A missing or empty secret is fatal; the process must refuse to start
    /// rather than run unauthenticated.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        match config.shared_secret.as_deref() {
            None | Some("") => Err(Error::Startup(
                "no shared secret configured; refusing to start unauthenticated".to_string(),
            )),
            Some(secret) => Ok(Self {
                secret: secret.to_string(),
            }),
        }
    }

    /// Check a request's credential headers.
    pub fn check(&self, headers: &HeaderMap) -> Result<()> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
            });

        let Some(token) = token else {
            return Err(Error::MissingCredential);
        };

        // Exact match only; comparison is constant-time so the check leaks
        // nothing about how much of the secret matched.
        if token.as_bytes().ct_eq(self.secret.as_bytes()).into() {
            Ok(())
        } else {
            Err(Error::InvalidCredential)
        }
    }
}

/// Authentication middleware, applied to every route before routing logic.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    // Liveness root stays reachable without a credential; CORS preflight
    // carries no Authorization header by design.
    if PUBLIC_PATHS.contains(&path) || request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    match gate.check(request.headers()) {
        Ok(()) => {
            debug!(path = %path, "Authenticated request");
            next.run(request).await
        }
        Err(err) => {
            warn!(path = %path, kind = err.kind(), "Rejected request");
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AuthGate {
        AuthGate::from_config(&AuthConfig {
            shared_secret: Some("s3cret-value".to_string()),
        })
        .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AuthGate::from_config(&AuthConfig {
            shared_secret: None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Startup(_)));

        let err = AuthGate::from_config(&AuthConfig {
            shared_secret: Some(String::new()),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Startup(_)));
    }

    #[test]
    fn no_credential_is_missing() {
        let err = gate().check(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
    }

    #[test]
    fn non_bearer_scheme_is_missing() {
        let err = gate()
            .check(&headers_with("Basic dXNlcjpwYXNz"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
    }

    #[test]
    fn wrong_credential_is_invalid() {
        let err = gate().check(&headers_with("Bearer wrong")).unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
    }

    #[test]
    fn partial_credential_is_invalid() {
        let err = gate().check(&headers_with("Bearer s3cret")).unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
    }

    #[test]
    fn case_mismatched_credential_is_invalid() {
        let err = gate()
            .check(&headers_with("Bearer S3CRET-VALUE"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredential));
    }

    #[test]
    fn exact_credential_is_accepted() {
        assert!(gate().check(&headers_with("Bearer s3cret-value")).is_ok());
    }

    #[test]
    fn lowercase_bearer_prefix_is_accepted() {
        assert!(gate().check(&headers_with("bearer s3cret-value")).is_ok());
    }
}
