//! Alert Routes

use alerting::DecodeError;
use axum::{body::Bytes, extract::State, Json};
use jira::build_issue;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::telemetry::{ALERTS_RECEIVED, ISSUES_CREATED, UPSTREAM_DURATION};
use crate::AppState;

/// Response for a created issue
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub status: &'static str,
    /// Jira issue key
    pub issue: Option<String>,
    /// REST URL of the issue
    pub url: Option<String>,
}

/// Turn an Alertmanager notification into a Jira issue
pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IssueResponse>, ApiError> {
    metrics::counter!(ALERTS_RECEIVED).increment(1);

    let payload = alerting::decode(&body)?;
    let alert = payload.first().ok_or(DecodeError::NoAlerts)?;
    info!(
        receiver = %payload.receiver,
        status = %payload.status,
        alertname = %alert.labels.alertname,
        severity = %alert.labels.severity,
        "Received alert"
    );
    if payload.alerts.len() > 1 {
        debug!(ignored = payload.alerts.len() - 1, "Only the first alert is forwarded");
    }

    let issue = build_issue(&state.template, &state.defaults, alert)?;

    let started = Instant::now();
    let result = state.jira.create_issue(&issue).await;
    metrics::histogram!(UPSTREAM_DURATION).record(started.elapsed().as_secs_f64());

    let created = result?;
    metrics::counter!(ISSUES_CREATED).increment(1);

    Ok(Json(IssueResponse {
        status: "ok",
        issue: created.key,
        url: created.self_url,
    }))
}
