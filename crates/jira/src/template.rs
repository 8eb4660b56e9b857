//! Issue Templates
//!
//! The issue-creation body is a JSON document with `{{ .Name }}`
//! placeholders inside string values. It comes either from the embedded
//! default or from a URL fetched once at startup.

use crate::issue::{self, RenderedIssue, TemplateContext};
use crate::{RenderError, TemplateError};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Where the issue template is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Built-in template
    Embedded,
    /// Fetched with a single unauthenticated GET
    Remote(String),
}

impl TemplateSource {
    /// An empty or missing URL selects the embedded template
    pub fn from_url(url: Option<&str>) -> Self {
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => TemplateSource::Remote(url.to_string()),
            _ => TemplateSource::Embedded,
        }
    }
}

/// Parsed issue template
#[derive(Debug, Clone, PartialEq)]
pub struct IssueTemplate {
    root: Value,
}

impl IssueTemplate {
    /// The built-in template.
    ///
    /// Custom field ids match the reference Jira project; deployments with
    /// different custom fields should serve their own template.
    pub fn embedded() -> Self {
        let root = json!({
            "fields": {
                "customfield_10008": "{{ .EpicLink}}",
                "project": {
                    "key": "{{ .Project}}"
                },
                "summary": "{{ .Summary}}",
                "description": "{{ .Description}}",
                "issuetype": {
                    "name": "Bug"
                },
                "customfield_10019": "none",
                "customfield_10020": "none",
                "customfield_10021": "none",
                "customfield_10022": [
                    {
                        "self": "https://project.atlassian.net/rest/api/2/customFieldOption/10007",
                        "value": "{{ .Environment}}"
                    }
                ],
                "components": [
                    { "name": "{{ .Component}}" }
                ],
                "priority": {
                    "name": "{{ .Priority}}"
                }
            }
        });
        Self { root }
    }

    /// Parse a template body, rejecting documents that are not JSON or
    /// that reference unknown fields.
    pub fn parse(body: &str) -> Result<Self, TemplateError> {
        let template = Self {
            root: serde_json::from_str(body)?,
        };
        template.render(&TemplateContext::default())?;
        Ok(template)
    }

    pub fn render(&self, ctx: &TemplateContext) -> Result<RenderedIssue, RenderError> {
        issue::render(&self.root, ctx)
    }
}

impl Default for IssueTemplate {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Resolve the issue template for the process lifetime.
///
/// Any failure fetching a remote template is logged and the embedded
/// template is used instead.
pub async fn load_template(source: &TemplateSource, http: &Client) -> IssueTemplate {
    match source {
        TemplateSource::Embedded => {
            info!("Using embedded issue template");
            IssueTemplate::embedded()
        }
        TemplateSource::Remote(url) => match fetch_template(http, url).await {
            Ok(template) => {
                info!(url = %url, "Loaded issue template");
                template
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Falling back to embedded issue template");
                IssueTemplate::embedded()
            }
        },
    }
}

async fn fetch_template(http: &Client, url: &str) -> Result<IssueTemplate, TemplateError> {
    let response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TemplateError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    IssueTemplate::parse(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CUSTOM: &str = r#"{"fields":{"project":{"key":"{{ .Project }}"},"summary":"[{{.Environment}}] {{ .Summary }}"}}"#;

    #[test]
    fn test_source_from_url() {
        assert_eq!(TemplateSource::from_url(None), TemplateSource::Embedded);
        assert_eq!(TemplateSource::from_url(Some("")), TemplateSource::Embedded);
        assert_eq!(TemplateSource::from_url(Some("  ")), TemplateSource::Embedded);
        assert_eq!(
            TemplateSource::from_url(Some("http://templates/jira.json")),
            TemplateSource::Remote("http://templates/jira.json".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(matches!(IssueTemplate::parse("{ not json"), Err(TemplateError::Parse(_))));
        assert!(matches!(
            IssueTemplate::parse(r#"{"summary":"{{ .Nope }}"}"#),
            Err(TemplateError::Render(RenderError::UnknownField(_)))
        ));
        assert!(IssueTemplate::parse(CUSTOM).is_ok());
    }

    #[tokio::test]
    async fn test_load_embedded() {
        let template = load_template(&TemplateSource::Embedded, &Client::new()).await;
        assert_eq!(template, IssueTemplate::embedded());
    }

    #[tokio::test]
    async fn test_load_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jira.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CUSTOM))
            .expect(1)
            .mount(&server)
            .await;

        let source = TemplateSource::Remote(format!("{}/jira.json", server.uri()));
        let template = load_template(&source, &Client::new()).await;
        assert_eq!(template, IssueTemplate::parse(CUSTOM).unwrap());
    }

    #[tokio::test]
    async fn test_load_remote_error_status_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(CUSTOM))
            .mount(&server)
            .await;

        let source = TemplateSource::Remote(format!("{}/jira.json", server.uri()));
        let template = load_template(&source, &Client::new()).await;
        assert_eq!(template, IssueTemplate::embedded());
    }

    #[tokio::test]
    async fn test_load_remote_invalid_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let source = TemplateSource::Remote(server.uri());
        let template = load_template(&source, &Client::new()).await;
        assert_eq!(template, IssueTemplate::embedded());
    }

    #[tokio::test]
    async fn test_load_unreachable_falls_back() {
        // Nothing listens on the discard port
        let source = TemplateSource::Remote("http://127.0.0.1:9/jira.json".to_string());
        let template = load_template(&source, &Client::new()).await;
        assert_eq!(template, IssueTemplate::embedded());
    }
}
