//! Alertmanager to Jira Bridge
//!
//! HTTP server that turns Alertmanager webhook notifications into Jira
//! issues, with a liveness probe and a Prometheus scrape endpoint.

use axum::{
    routing::{get, post},
    Router,
};
use jira::{load_template, IssueDefaults, IssueTemplate, JiraClient, TrackerError};
use metrics_exporter_prometheus::PrometheusHandle;
use metrics_process::Collector;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
pub mod error;
mod routes;
pub mod telemetry;

pub use self::config::{BridgeConfig, ConfigError, LogFormat};
pub use self::telemetry::{detached_metrics, init_logging, install_metrics};

/// Startup and serving failures
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Application state shared across handlers; read-only once built
pub struct AppState {
    /// Jira REST client
    pub jira: JiraClient,
    /// Issue template resolved at startup
    pub template: IssueTemplate,
    /// Configured issue fields
    pub defaults: IssueDefaults,
    /// Prometheus exposition handle
    pub metrics: PrometheusHandle,
    /// Process metrics sampler, run before each render
    pub process: Collector,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// This is the only place the issue template is fetched.
    pub async fn from_config(
        config: &BridgeConfig,
        metrics: PrometheusHandle,
    ) -> Result<Self, TrackerError> {
        let jira = JiraClient::new(
            &config.jira_url,
            &config.jira_user,
            config.jira_api_token(),
            config.jira_timeout,
        )?;
        let template = load_template(&config.template_source(), jira.http()).await;

        Ok(Self {
            jira,
            template,
            defaults: config.defaults.clone(),
            metrics,
            process: Collector::default(),
        })
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::render))
        .route("/healthz", get(routes::health::healthz))
        .route("/jira", post(routes::alerts::create_issue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until shutdown
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServeError> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Run the server
pub async fn run_server(config: BridgeConfig, metrics: PrometheusHandle) -> Result<(), ServeError> {
    let state = Arc::new(AppState::from_config(&config, metrics).await?);

    let addr = SocketAddr::new(config.bind_address, config.port);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    info!("Starting API server on {}", addr);
    serve(listener, state).await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
