//! Jira REST Client
//!
//! Creates issues through `/rest/api/2/issue` and probes `/status` for
//! liveness. Every call is a single attempt; Alertmanager re-delivers
//! notifications that fail.

use crate::issue::RenderedIssue;
use crate::TrackerError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Issue creation endpoint, relative to the Jira base URL
const ISSUE_PATH: &str = "/rest/api/2/issue";

/// Liveness endpoint, relative to the Jira base URL
const STATUS_PATH: &str = "/status";

/// Default timeout for Jira requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Issue reference returned by Jira on 201 Created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Issue key, e.g. `ABC-42`
    pub key: Option<String>,
    /// Canonical REST URL of the issue
    #[serde(rename = "self")]
    pub self_url: Option<String>,
}

/// Reachability of the Jira `/status` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamStatus {
    Available,
    Unavailable,
}

impl UpstreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamStatus::Available => "available",
            UpstreamStatus::Unavailable => "unavailable",
        }
    }
}

/// Jira REST API client
///
/// Credentials are attached to each request individually; the underlying
/// connection pool carries no auth state.
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    username: String,
    api_token: String,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl JiraClient {
    /// Create a new Jira client
    ///
    /// # Arguments
    /// * `base_url` - Jira site URL, e.g. `https://project.atlassian.net`
    /// * `username` - Account used for Basic authentication
    /// * `api_token` - API token paired with `username`
    /// * `timeout` - Upper bound for each request, including reading the body
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TrackerError::Client)?;

        Ok(Self::with_client(http, base_url, username, api_token))
    }

    /// Create a client around an existing HTTP client
    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Creating Jira client");

        Self {
            http,
            base_url,
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, shared for other unauthenticated calls
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Create an issue from a rendered template
    ///
    /// Only `201 Created` counts as success. A 201 whose body is empty or
    /// not JSON is reported as [`TrackerError::InvalidResponse`] rather
    /// than a success with no key; a JSON body missing `key` or `self`
    /// leaves that field `None`.
    pub async fn create_issue(&self, issue: &RenderedIssue) -> Result<CreatedIssue, TrackerError> {
        let url = format!("{}{ISSUE_PATH}", self.base_url);
        debug!(url = %url, "POST issue");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.api_token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "*/*")
            .body(issue.as_str().to_owned())
            .send()
            .await
            .map_err(TrackerError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(TrackerError::transport)?;
        info!(status = status.as_u16(), "Jira responded to issue creation");

        match status {
            StatusCode::CREATED => {
                let created: CreatedIssue = serde_json::from_str(&body).map_err(|e| {
                    warn!(error = %e, body = %body, "Failed to parse Jira response");
                    TrackerError::InvalidResponse(e)
                })?;
                info!(key = ?created.key, "Created Jira issue");
                Ok(created)
            }
            s if s.is_client_error() || s.is_server_error() => {
                warn!(status = s.as_u16(), body = %body, "Jira rejected issue");
                Err(TrackerError::Rejected {
                    status: s.as_u16(),
                    body,
                })
            }
            s => {
                warn!(status = s.as_u16(), body = %body, "Unexpected Jira response status");
                Err(TrackerError::UnexpectedStatus {
                    status: s.as_u16(),
                    body,
                })
            }
        }
    }

    /// Probe Jira's status endpoint
    pub async fn check_status(&self) -> UpstreamStatus {
        let url = format!("{}{STATUS_PATH}", self.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => UpstreamStatus::Available,
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Jira status check failed");
                UpstreamStatus::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "Jira status endpoint unreachable");
                UpstreamStatus::Unavailable
            }
        }
    }
}
