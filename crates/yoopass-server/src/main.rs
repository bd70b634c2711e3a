//! Yoopass server binary.
//!
//! Serves the secret sharing API over HTTP.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use yoopass_server::cli::{Cli, LogFormat};
use yoopass_server::YoopassServer;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match cli.log_format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let config = cli.to_config();
    info!(bind = %config.bind_addr, store = %config.store, "Starting yoopass");

    let server = match YoopassServer::from_config(config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to initialise server");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
