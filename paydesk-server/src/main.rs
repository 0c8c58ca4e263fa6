#![cfg_attr(not(test), forbid(unsafe_code))]

//! Main entry point for the `PayDesk` edge server CLI.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use paydesk_server::server;
use shared::config::server::Config;
use std::path::PathBuf;


/// Main CLI structure for the `PayDesk` edge server
#[derive(Parser)]
#[command(name = "paydesk-server")]
#[command(about = "Edge server for the PayDesk admin dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for the `PayDesk` CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Start the edge server
    Serve {
        /// The port number to bind the server to (e.g., 8080)
        #[arg(long, short)]
        port: u16,

        /// Path to a YAML, JSON or TOML configuration file. Profile defaults
        /// are used when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

/// Loads the configuration and runs the server until shutdown.
///
/// # Errors
/// Returns an error if configuration loading or server startup fails.
pub async fn handle_serve_command(port: u16, config: Option<PathBuf>) -> anyhow::Result<()> {
    let resolved_config = Config::load_config(config, Some(port))?;
    server::run(resolved_config).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => handle_serve_command(port, config).await,
    }
}
