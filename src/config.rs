//! Configuration management
//!
//! All configuration is read from the environment with the `DBOPS_GATEWAY_`
//! prefix and `__` section splitting, e.g. `DBOPS_GATEWAY_SERVER__PORT=8080`
//! or `DBOPS_GATEWAY_AUTH__SHARED_SECRET=...`. A `.env` file in the working
//! directory is loaded first when present.

use figment::{Figment, providers::Env};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Upstream control-plane API configuration
    pub upstream: UpstreamConfig,
    /// Streaming configuration
    pub streaming: StreamingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret every inbound request must present as a bearer
    /// credential. Absence is fatal at startup; the gateway never runs
    /// unauthenticated.
    pub shared_secret: Option<String>,
}

/// Upstream control-plane API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the control-plane API
    pub base_url: String,
    /// API credential forwarded as a bearer token on every upstream call
    pub api_key: Option<String>,
    /// Request timeout in seconds for upstream calls
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://console.dbops.dev/api/v1".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Streaming transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Per-session outbound frame buffer size
    pub buffer_size: usize,
    /// SSE keep-alive interval in seconds
    pub keep_alive_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            keep_alive_secs: 15,
        }
    }
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let figment = Figment::new().merge(Env::prefixed("DBOPS_GATEWAY_").split("__"));

        figment
            .extract()
            .map_err(|e| Error::Startup(format!("invalid configuration: {e}")))
    }

    /// Check that everything required to serve is present.
    ///
    /// Called before the listener is bound; any error here aborts startup.
    pub fn validate(&self) -> Result<()> {
        match self.auth.shared_secret.as_deref() {
            None | Some("") => {
                return Err(Error::Startup(
                    "DBOPS_GATEWAY_AUTH__SHARED_SECRET is not set; \
                     refusing to start unauthenticated"
                        .to_string(),
                ));
            }
            Some(_) => {}
        }

        match self.upstream.api_key.as_deref() {
            None | Some("") => {
                return Err(Error::Startup(
                    "DBOPS_GATEWAY_UPSTREAM__API_KEY is not set; \
                     tool handlers cannot reach the control-plane API"
                        .to_string(),
                ));
            }
            Some(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        Config {
            auth: AuthConfig {
                shared_secret: Some("s3cret".to_string()),
            },
            upstream: UpstreamConfig {
                api_key: Some("upstream-key".to_string()),
                ..UpstreamConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.streaming.buffer_size, 64);
        assert!(config.auth.shared_secret.is_none());
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn missing_shared_secret_is_fatal() {
        let mut config = configured();
        config.auth.shared_secret = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Startup(_)));
        assert!(err.to_string().contains("SHARED_SECRET"));
    }

    #[test]
    fn empty_shared_secret_is_fatal() {
        let mut config = configured();
        config.auth.shared_secret = Some(String::new());
        assert!(matches!(config.validate(), Err(Error::Startup(_))));
    }

    #[test]
    fn missing_upstream_key_is_fatal() {
        let mut config = configured();
        config.upstream.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }
}
