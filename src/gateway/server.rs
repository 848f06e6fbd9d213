//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::auth::AuthGate;
use super::router::{AppState, create_router};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::pipeline::InvocationPipeline;
use crate::session::SessionRegistry;
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// The gateway process
pub struct Gateway {
    config: Config,
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a gateway from validated configuration.
    ///
    /// Everything that can fail fails here, before any listener is bound:
    /// missing secrets, a malformed upstream URL, or a bad catalog.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let auth = Arc::new(AuthGate::from_config(&config.auth)?);
        let upstream = Arc::new(UpstreamClient::from_config(&config.upstream)?);
        let catalog = Arc::new(Catalog::builtin(upstream)?);
        let pipeline = InvocationPipeline::new(Arc::clone(&catalog));

        let state = Arc::new(AppState {
            catalog,
            pipeline,
            sessions: Arc::new(SessionRegistry::new()),
            auth,
            streaming: config.streaming.clone(),
            started_at: Utc::now(),
        });

        Ok(Self { config, state })
    }

    /// Run the gateway until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Startup(format!("invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("DBOPS GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(host = %self.config.server.host, port = self.config.server.port, "Listening");
        info!(tools = self.state.catalog.tool_count(), "Catalog ready");
        info!(
            "  POST http://{}:{}/api/tools/{{name}}/execute  (synchronous)",
            self.config.server.host, self.config.server.port
        );
        info!(
            "  GET  http://{}:{}/stream  (streaming sessions)",
            self.config.server.host, self.config.server.port
        );
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Setup(e.to_string()))?;

        info!("Shutdown complete");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
