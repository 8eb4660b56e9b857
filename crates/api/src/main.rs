//! Alertmanager to Jira Bridge - Main Entry Point

use api::{init_logging, install_metrics, run_server, BridgeConfig};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.log_format) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    info!("=== Alertmanager Jira bridge v{} ===", env!("CARGO_PKG_VERSION"));
    info!(config = ?config, "Loaded configuration");

    let metrics = match install_metrics() {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Failed to install metrics recorder");
            return ExitCode::FAILURE;
        }
    };

    match run_server(config, metrics).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
