//! dbops-gateway - database operations gateway

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use dbops_gateway::{
    cli::{Cli, Command},
    config::Config,
    gateway::Gateway,
    register, setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load a .env file before anything reads the environment.
    dotenvy::dotenv().ok();

    let mut cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command.take() {
        Some(Command::Register {
            name,
            config_path,
            url,
        }) => run_register(&cli, &name, config_path, url),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Run the gateway server
async fn run_server(cli: Cli) -> ExitCode {
    let config = match Config::load() {
        Ok(mut config) => {
            // Apply CLI overrides
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host = host.clone();
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting gateway"
    );

    let gateway = match Gateway::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to start gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}

/// Register the gateway with a desktop client
fn run_register(
    cli: &Cli,
    name: &str,
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
) -> ExitCode {
    let Some(path) = config_path.or_else(register::default_config_path) else {
        error!("Could not determine the client config path; pass --config-path");
        return ExitCode::FAILURE;
    };

    let stream_url = url.unwrap_or_else(|| {
        let host = cli.host.as_deref().unwrap_or("127.0.0.1");
        let port = cli.port.unwrap_or(3000);
        format!("http://{host}:{port}/stream")
    });

    match register::register(&path, name, &stream_url) {
        Ok(()) => {
            println!("Registered '{name}' -> {stream_url} in {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Registration failed: {e}");
            ExitCode::FAILURE
        }
    }
}
