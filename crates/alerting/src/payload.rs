//! Alertmanager v4 Payload Types

use crate::DecodeError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Webhook body posted by Alertmanager (`version: "4"`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertPayload {
    pub receiver: String,
    /// `firing` or `resolved`
    pub status: String,
    pub version: String,
    pub group_key: String,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub alerts: Vec<Alert>,
}

/// A single alert within a webhook payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Alert {
    pub status: String,
    pub labels: Labels,
    pub annotations: Annotations,
    pub starts_at: String,
    pub ends_at: String,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

/// Labels consumed by the bridge; any others are dropped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub alertname: String,
    pub instance: String,
    pub job: String,
    pub severity: String,
}

/// Annotations consumed by the bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub description: String,
    pub summary: String,
}

impl AlertPayload {
    /// The alert an issue is built from.
    ///
    /// Only the first entry is used; trailing alerts in a grouped
    /// notification are ignored.
    pub fn first(&self) -> Option<&Alert> {
        self.alerts.first()
    }
}

impl Alert {
    /// Issue summary: `<severity>: <alertname> <job> (<instance>)`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} {} ({})",
            self.labels.severity, self.labels.alertname, self.labels.job, self.labels.instance
        )
    }
}

/// Decode a webhook body
///
/// Fails if the body is not valid JSON of the expected shape or if it
/// carries no alerts. Unknown fields are ignored.
pub fn decode(body: &[u8]) -> Result<AlertPayload, DecodeError> {
    let payload: AlertPayload = serde_json::from_slice(body)?;

    if payload.alerts.is_empty() {
        return Err(DecodeError::NoAlerts);
    }

    debug!(
        receiver = %payload.receiver,
        status = %payload.status,
        alerts = payload.alerts.len(),
        "Decoded alert payload"
    );

    Ok(payload)
}
