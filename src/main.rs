//! script-gate
//!
//! Serves `GET /obtener-script`: callers present an API key (and, when
//! configured, an identity prefix and a signed timestamp); authorized
//! requests get the upstream script, everything else gets an opaque answer.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use script_gate::config::{self, Credentials};
use script_gate::observability::logging;
use script_gate::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "script-gate")]
#[command(about = "Authorizing gate in front of a single upstream script", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "SCRIPT_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref(), |name| std::env::var(name).ok())?;

    logging::init(&config.observability);
    tracing::info!("script-gate v{} starting", env!("CARGO_PKG_VERSION"));
    logging::log_startup(&config, &Credentials::from_config(&config));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
