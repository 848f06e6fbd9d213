//! End-to-end authentication tests
//!
//! Exercises the full gate contract: missing vs wrong vs exact credential,
//! and the fatal startup condition when no secret is configured.

use axum::http::{HeaderMap, HeaderValue};
use dbops_gateway::Error;
use dbops_gateway::config::AuthConfig;
use dbops_gateway::gateway::AuthGate;

fn gate_with(secret: &str) -> AuthGate {
    AuthGate::from_config(&AuthConfig {
        shared_secret: Some(secret.to_string()),
    })
    .unwrap()
}

fn bearer(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {value}")).unwrap(),
    );
    headers
}

#[test]
fn gate_requires_a_configured_secret() {
    let err = AuthGate::from_config(&AuthConfig {
        shared_secret: None,
    })
    .unwrap_err();
    assert!(matches!(err, Error::Startup(_)));
}

#[test]
fn requests_without_credential_fail_as_missing() {
    let gate = gate_with("the-secret");
    assert!(matches!(
        gate.check(&HeaderMap::new()),
        Err(Error::MissingCredential)
    ));
}

#[test]
fn requests_with_wrong_credential_fail_as_invalid() {
    let gate = gate_with("the-secret");

    for wrong in ["nope", "the-secre", "the-secret-x", "THE-SECRET", ""] {
        assert!(
            matches!(gate.check(&bearer(wrong)), Err(Error::InvalidCredential)),
            "credential {wrong:?} should be rejected as invalid"
        );
    }
}

#[test]
fn exact_credential_always_accepted() {
    let gate = gate_with("the-secret");
    assert!(gate.check(&bearer("the-secret")).is_ok());
    // Repeated checks stay accepted; the gate has no state to exhaust.
    assert!(gate.check(&bearer("the-secret")).is_ok());
}

#[test]
fn missing_and_invalid_map_to_distinct_statuses() {
    assert_eq!(Error::MissingCredential.status_code().as_u16(), 401);
    assert_eq!(Error::InvalidCredential.status_code().as_u16(), 403);
}
