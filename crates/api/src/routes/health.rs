//! Health Routes

use axum::{extract::State, Json};
use jira::UpstreamStatus;
use serde::Serialize;
use std::sync::Arc;

use crate::telemetry::HEALTHZ_CHECKS;
use crate::AppState;

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub upstream: UpstreamStatus,
}

/// Liveness check.
///
/// Always answers 200 while the process is serving; Jira reachability is
/// reported in `upstream`.
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let upstream = state.jira.check_status().await;
    metrics::counter!(HEALTHZ_CHECKS, "upstream" => upstream.as_str()).increment(1);

    Json(HealthResponse {
        status: "healthy",
        upstream,
    })
}
