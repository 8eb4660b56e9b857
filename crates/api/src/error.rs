//! API error responses

use alerting::DecodeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jira::{RenderError, TrackerError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::telemetry::UPSTREAM_ERRORS;

/// Per-request failures of the alert pipeline
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// JSON envelope for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_response: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            upstream_response: None,
            error: None,
        }
    }
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Decode(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: Some(e.to_string()),
                    ..ErrorResponse::new("bad request")
                },
            ),
            ApiError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("render error"),
            ),
            ApiError::Tracker(TrackerError::Rejected { status, .. }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                ErrorResponse {
                    upstream_response: Some(*status),
                    ..ErrorResponse::new("upstream server error")
                },
            ),
            ApiError::Tracker(TrackerError::UnexpectedStatus { status, .. }) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    upstream_response: Some(*status),
                    ..ErrorResponse::new("unexpected upstream status")
                },
            ),
            ApiError::Tracker(TrackerError::Timeout) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorResponse::new("upstream timeout"),
            ),
            ApiError::Tracker(TrackerError::InvalidResponse(_)) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("invalid upstream response"),
            ),
            ApiError::Tracker(TrackerError::Unavailable(_) | TrackerError::Client(_)) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("upstream unavailable"),
            ),
        }
    }

    /// Label for the upstream error counter
    fn kind(&self) -> Option<&'static str> {
        match self {
            ApiError::Tracker(TrackerError::Rejected { .. }) => Some("rejected"),
            ApiError::Tracker(TrackerError::UnexpectedStatus { .. }) => Some("unexpected_status"),
            ApiError::Tracker(TrackerError::Timeout) => Some("timeout"),
            ApiError::Tracker(TrackerError::InvalidResponse(_)) => Some("invalid_response"),
            ApiError::Tracker(_) => Some("unavailable"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Alert request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Alert request failed");
        }

        if let Some(kind) = self.kind() {
            metrics::counter!(UPSTREAM_ERRORS, "kind" => kind).increment(1);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_passes_status_through() {
        let err = ApiError::Tracker(TrackerError::Rejected {
            status: 403,
            body: "forbidden".to_string(),
        });
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.status, "upstream server error");
        assert_eq!(body.upstream_response, Some(403));
    }

    #[test]
    fn test_error_kinds() {
        let (status, _) = ApiError::Decode(DecodeError::NoAlerts).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            ApiError::Render(RenderError::UnknownField("X".to_string())).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, body) = ApiError::Tracker(TrackerError::UnexpectedStatus {
            status: 200,
            body: String::new(),
        })
        .status_and_body();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.upstream_response, Some(200));

        let (status, _) = ApiError::Tracker(TrackerError::Timeout).status_and_body();
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::Tracker(TrackerError::Rejected {
            status: 500,
            body: String::new(),
        });
        let (_, body) = err.status_and_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "upstream server error", "upstream_response": 500 })
        );
    }
}
