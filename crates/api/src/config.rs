//! Bridge configuration
//!
//! Loaded once at startup from environment variables and immutable
//! afterwards.

use jira::{IssueDefaults, TemplateSource, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors (fatal at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown LOG_FORMAT {other:?}"))),
        }
    }
}

/// Bridge configuration
#[derive(Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Listen address (`BIND_ADDRESS`)
    pub bind_address: IpAddr,
    /// Listen port (`PORT`)
    pub port: u16,
    /// Issue fields taken from `ALERT_EPICLINK`, `DEFAULT_PROJECT`,
    /// `ALERT_COMPONENT`, `ALERT_ENV` and `ALERT_PRIORITY`
    pub defaults: IssueDefaults,
    /// Jira site URL without trailing slash (`JIRA_URL`)
    pub jira_url: String,
    /// Basic-auth user (`JIRA_USER`)
    pub jira_user: String,
    jira_api_token: String,
    /// Optional template location (`JIRA_TEMPLATE_URL`)
    pub jira_template_url: Option<String>,
    /// Upstream request timeout (`JIRA_TIMEOUT_SECS`)
    pub jira_timeout: Duration,
    /// `LOG_FORMAT`: `text` or `json`
    pub log_format: LogFormat,
}

/// Shape of the environment after defaults are applied
#[derive(Deserialize)]
struct RawConfig {
    bind_address: String,
    port: u16,
    alert_env: String,
    alert_priority: String,
    alert_component: String,
    default_project: String,
    alert_epiclink: String,
    jira_url: String,
    #[serde(default)]
    jira_user: Option<String>,
    #[serde(default)]
    jira_api_token: Option<String>,
    #[serde(default)]
    jira_template_url: Option<String>,
    jira_timeout_secs: u64,
    log_format: String,
}

impl BridgeConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(::config::Environment::default())
    }

    /// Load from an explicit set of variables instead of the process
    /// environment
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: ::config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::load(::config::Environment::default().source(Some(vars)))
    }

    fn load(env: ::config::Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = ::config::Config::builder()
            .set_default("bind_address", Ipv4Addr::UNSPECIFIED.to_string())?
            .set_default("port", 7337_i64)?
            .set_default("alert_env", "Dev")?
            .set_default("alert_priority", "High")?
            .set_default("alert_component", "platform")?
            .set_default("default_project", "ABC")?
            .set_default("alert_epiclink", "AM-1")?
            .set_default("jira_url", "https://project.atlassian.net")?
            .set_default("jira_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("log_format", "text")?
            .add_source(env.ignore_empty(true))
            .build()?
            .try_deserialize()?;

        let jira_user = raw.jira_user.ok_or(ConfigError::Missing("JIRA_USER"))?;
        let jira_api_token = raw
            .jira_api_token
            .ok_or(ConfigError::Missing("JIRA_API_TOKEN"))?;

        if raw.jira_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "JIRA_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let bind_address = raw.bind_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("BIND_ADDRESS {:?} is not an IP address", raw.bind_address))
        })?;

        Ok(Self {
            bind_address,
            port: raw.port,
            defaults: IssueDefaults {
                epic_link: raw.alert_epiclink,
                project: raw.default_project,
                component: raw.alert_component,
                environment: raw.alert_env,
                priority: raw.alert_priority,
            },
            jira_url: raw.jira_url.trim_end_matches('/').to_string(),
            jira_user,
            jira_api_token,
            jira_template_url: raw.jira_template_url,
            jira_timeout: Duration::from_secs(raw.jira_timeout_secs),
            log_format: raw.log_format.parse()?,
        })
    }

    /// Jira API token (`JIRA_API_TOKEN`); never log this
    pub fn jira_api_token(&self) -> &str {
        &self.jira_api_token
    }

    pub fn template_source(&self) -> TemplateSource {
        TemplateSource::from_url(self.jira_template_url.as_deref())
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("defaults", &self.defaults)
            .field("jira_url", &self.jira_url)
            .field("jira_user", &self.jira_user)
            .field("jira_api_token", &"<redacted>")
            .field("jira_template_url", &self.jira_template_url)
            .field("jira_timeout", &self.jira_timeout)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![("JIRA_USER", "u"), ("JIRA_API_TOKEN", "t")]
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::from_vars(required()).unwrap();
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 7337);
        assert_eq!(config.defaults.environment, "Dev");
        assert_eq!(config.defaults.priority, "High");
        assert_eq!(config.defaults.component, "platform");
        assert_eq!(config.defaults.project, "ABC");
        assert_eq!(config.defaults.epic_link, "AM-1");
        assert_eq!(config.jira_url, "https://project.atlassian.net");
        assert_eq!(config.jira_user, "u");
        assert_eq!(config.jira_api_token(), "t");
        assert_eq!(config.jira_template_url, None);
        assert_eq!(config.template_source(), TemplateSource::Embedded);
        assert_eq!(config.jira_timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let mut vars = required();
        vars.extend([
            ("BIND_ADDRESS", "127.0.0.1"),
            ("PORT", "8080"),
            ("ALERT_ENV", "Prod"),
            ("ALERT_PRIORITY", "Highest"),
            ("ALERT_COMPONENT", "storage"),
            ("DEFAULT_PROJECT", "OPS"),
            ("ALERT_EPICLINK", "OPS-7"),
            ("JIRA_URL", "https://x/"),
            ("JIRA_TEMPLATE_URL", "http://templates/jira.json"),
            ("JIRA_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "json"),
        ]);

        let config = BridgeConfig::from_vars(vars).unwrap();
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.defaults,
            IssueDefaults {
                epic_link: "OPS-7".to_string(),
                project: "OPS".to_string(),
                component: "storage".to_string(),
                environment: "Prod".to_string(),
                priority: "Highest".to_string(),
            }
        );
        assert_eq!(config.jira_url, "https://x");
        assert_eq!(
            config.template_source(),
            TemplateSource::Remote("http://templates/jira.json".to_string())
        );
        assert_eq!(config.jira_timeout, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_user() {
        let err = BridgeConfig::from_vars([("JIRA_API_TOKEN", "t")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JIRA_USER")));
        assert!(err.to_string().contains("JIRA_USER"));
    }

    #[test]
    fn test_missing_token() {
        let err = BridgeConfig::from_vars([("JIRA_USER", "u")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JIRA_API_TOKEN")));
    }

    #[test]
    fn test_empty_required_counts_as_missing() {
        let err = BridgeConfig::from_vars([("JIRA_USER", ""), ("JIRA_API_TOKEN", "t")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JIRA_USER")));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = required();
        vars.push(("PORT", "not-a-port"));
        assert!(matches!(
            BridgeConfig::from_vars(vars),
            Err(ConfigError::Invalid(_))
        ));

        let mut vars = required();
        vars.push(("LOG_FORMAT", "xml"));
        assert!(matches!(
            BridgeConfig::from_vars(vars),
            Err(ConfigError::Invalid(_))
        ));

        let mut vars = required();
        vars.push(("LOG_FORMAT", "pretty"));
        assert!(matches!(
            BridgeConfig::from_vars(vars),
            Err(ConfigError::Invalid(_))
        ));

        let mut vars = required();
        vars.push(("BIND_ADDRESS", "localhost"));
        assert!(matches!(
            BridgeConfig::from_vars(vars),
            Err(ConfigError::Invalid(_))
        ));

        let mut vars = required();
        vars.push(("JIRA_TIMEOUT_SECS", "0"));
        assert!(matches!(
            BridgeConfig::from_vars(vars),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = BridgeConfig::from_vars([("JIRA_USER", "u"), ("JIRA_API_TOKEN", "s3cr3t")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
    }
}
