//! Database operations gateway
//!
//! Exposes a fixed catalog of database control-plane operations ("tools")
//! and readable resources over two transport bindings:
//!
//! - **Streaming**: long-lived SSE sessions with out-of-band message
//!   delivery, for desktop clients speaking the tool protocol
//! - **Synchronous**: plain HTTP request/response under `/api`
//!
//! Every inbound request passes a bearer-credential gate; tool input is
//! validated against per-tool JSON schemas before the handler runs. Tool
//! bodies are thin glue over an upstream control-plane API and carry no
//! logic of their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod protocol;
pub mod register;
pub mod session;
pub mod upstream;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
