//! Alertmanager Webhook Payloads
//!
//! Decodes the Prometheus Alertmanager v4 webhook body into typed records.

mod payload;

pub use payload::{decode, Alert, AlertPayload, Annotations, Labels};

use thiserror::Error;

/// Errors while decoding an incoming webhook body
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed alert payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Alert payload contains no alerts")]
    NoAlerts,
}
