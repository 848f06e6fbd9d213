//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Gateway exposing database control-plane operations as schema-validated
/// tools over SSE and plain HTTP
#[derive(Parser, Debug)]
#[command(name = "dbops-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DBOPS_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "DBOPS_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "DBOPS_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "DBOPS_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Register this gateway with a desktop client's configuration file
    Register {
        /// Entry name to register under
        #[arg(long, default_value = "dbops-gateway")]
        name: String,

        /// Client config file to write (defaults to the desktop client's
        /// standard location)
        #[arg(long)]
        config_path: Option<PathBuf>,

        /// Streaming URL the client should connect to
        #[arg(long)]
        url: Option<String>,
    },
}
