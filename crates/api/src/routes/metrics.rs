//! Metrics Routes

use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

use crate::AppState;

/// Prometheus text exposition, with process metrics sampled at scrape time
pub async fn render(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.process.collect();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}
