//! Jira Integration
//!
//! Issue templates, template rendering from alerts, and the REST client
//! used to create issues.

mod client;
mod issue;
mod template;

pub use client::{CreatedIssue, JiraClient, UpstreamStatus, DEFAULT_TIMEOUT_SECS};
pub use issue::{build_issue, IssueDefaults, RenderedIssue, TemplateContext};
pub use template::{load_template, IssueTemplate, TemplateSource};

use thiserror::Error;

/// Errors while obtaining an issue template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Template server returned status {0}")]
    Status(u16),
    #[error("Template is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Template does not render: {0}")]
    Render(#[from] RenderError),
}

/// Errors while rendering a template into an issue body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Unknown template field: {0}")]
    UnknownField(String),
    #[error("Unterminated placeholder in {0:?}")]
    Unterminated(String),
}

/// Errors talking to the Jira REST API
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Jira unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("Jira request timed out")]
    Timeout,
    #[error("Jira rejected request with status {status}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected Jira response status {status}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Invalid Jira response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl TrackerError {
    /// Upstream status code, when Jira answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            TrackerError::Rejected { status, .. }
            | TrackerError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TrackerError::Timeout
        } else {
            TrackerError::Unavailable(err)
        }
    }
}
