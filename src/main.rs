//! VibeCheck CLI.
//!
//! ```bash
//! vibecheck serve   # start the MCP server
//! ```
//!
//! Configuration comes from environment variables; see [`vibecheck::config`].

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vibecheck::config::Config;
use vibecheck::server;

/// VibeCheck: CV / job-description analysis over MCP.
#[derive(Parser)]
#[command(
    name = "vibecheck",
    about = "CV / job-description analysis MCP server",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server.
    ///
    /// Serves the MCP endpoint on POST /mcp plus liveness and readiness
    /// probes under /health. Configured via VIBECHECK_* environment
    /// variables.
    Serve,
}

/// Initializes tracing from `LOG_LEVEL` (debug|info|warn|error, default
/// info) and `LOG_FORMAT` (text|json, default text).
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = match level.as_str() {
        "debug" | "info" | "warn" | "error" => level,
        _ => "info".to_string(),
    };
    let filter = EnvFilter::new(level);

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    if format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: failed to load configuration: {e:#}");
                    std::process::exit(1);
                }
            };

            if let Err(e) = server::run_server(&config).await {
                tracing::error!(error = %e, "server failed");
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}
