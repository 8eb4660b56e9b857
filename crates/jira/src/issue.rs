//! Issue Builder
//!
//! Renders an issue template with fields taken from an alert and the
//! configured defaults.

use crate::template::IssueTemplate;
use crate::RenderError;
use alerting::Alert;
use serde_json::{Map, Value};

/// Issue fields that always come from configuration, never from the alert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDefaults {
    pub epic_link: String,
    pub project: String,
    pub component: String,
    pub environment: String,
    pub priority: String,
}

/// Values substituted into the template placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    pub summary: String,
    pub description: String,
    pub epic_link: String,
    pub project: String,
    pub component: String,
    pub environment: String,
    pub priority: String,
}

impl TemplateContext {
    pub fn new(defaults: &IssueDefaults, alert: &Alert) -> Self {
        Self {
            summary: alert.summary_line(),
            description: alert.annotations.description.clone(),
            epic_link: defaults.epic_link.clone(),
            project: defaults.project.clone(),
            component: defaults.component.clone(),
            environment: defaults.environment.clone(),
            priority: defaults.priority.clone(),
        }
    }

    /// Look up a placeholder by its template name
    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "Summary" => &self.summary,
            "Description" => &self.description,
            "EpicLink" => &self.epic_link,
            "Project" => &self.project,
            "Component" => &self.component,
            "Environment" => &self.environment,
            "Priority" => &self.priority,
            _ => return None,
        };
        Some(value)
    }
}

/// JSON request body for issue creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedIssue(String);

impl RenderedIssue {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Build the issue body for an alert
pub fn build_issue(
    template: &IssueTemplate,
    defaults: &IssueDefaults,
    alert: &Alert,
) -> Result<RenderedIssue, RenderError> {
    template.render(&TemplateContext::new(defaults, alert))
}

/// Render a parsed template tree.
///
/// Placeholders are only expanded inside string values, and the result is
/// re-encoded by serde_json, so any alert text stays properly escaped.
pub(crate) fn render(root: &Value, ctx: &TemplateContext) -> Result<RenderedIssue, RenderError> {
    let rendered = render_value(root, ctx)?;
    Ok(RenderedIssue(rendered.to_string()))
}

fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value, RenderError> {
    Ok(match value {
        Value::String(s) => Value::String(substitute(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, ctx))
                .collect::<Result<Vec<_>, RenderError>>()?,
        ),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, item) in fields {
                out.insert(key.clone(), render_value(item, ctx)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

/// Expand `{{ .Name }}` placeholders in a single string
fn substitute(input: &str, ctx: &TemplateContext) -> Result<String, RenderError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| RenderError::Unterminated(input.to_string()))?;

        let name = after[..end].trim();
        let value = name
            .strip_prefix('.')
            .and_then(|field| ctx.field(field.trim()))
            .ok_or_else(|| RenderError::UnknownField(name.to_string()))?;
        out.push_str(value);

        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
