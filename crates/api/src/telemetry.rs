//! Logging and Prometheus metrics setup

use crate::config::LogFormat;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use tracing_subscriber::EnvFilter;

pub const ALERTS_RECEIVED: &str = "alerts_received_total";
pub const ISSUES_CREATED: &str = "issues_created_total";
pub const UPSTREAM_ERRORS: &str = "upstream_errors_total";
pub const HEALTHZ_CHECKS: &str = "healthz_checks_total";
pub const UPSTREAM_DURATION: &str = "upstream_request_duration_seconds";

const DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Initialize logging
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging(format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

/// Install the global Prometheus recorder and return the handle that
/// renders `/metrics`.
///
/// Process metrics (`process_cpu_seconds_total`,
/// `process_resident_memory_bytes`, ...) are described here and sampled
/// on every scrape.
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(UPSTREAM_DURATION.to_string()), DURATION_BUCKETS)?
        .install_recorder()?;
    describe_metrics();
    Collector::default().describe();
    Ok(handle)
}

/// Recorder handle that is not installed globally, for tests
pub fn detached_metrics() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

fn describe_metrics() {
    metrics::describe_counter!(ALERTS_RECEIVED, "Alert notifications received on /jira");
    metrics::describe_counter!(ISSUES_CREATED, "Jira issues created");
    metrics::describe_counter!(UPSTREAM_ERRORS, "Failed Jira issue creations by kind");
    metrics::describe_counter!(HEALTHZ_CHECKS, "Health checks by upstream availability");
    metrics::describe_histogram!(
        UPSTREAM_DURATION,
        metrics::Unit::Seconds,
        "Latency of Jira issue creation requests"
    );
    metrics::gauge!("build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}
