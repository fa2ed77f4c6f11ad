//! Client configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve backend/identity-provider endpoints and local paths.
//! - Make demo-data fallback an explicit switch.
//!
//! # Invariants
//! - Required provider settings fail fast instead of defaulting.
//! - URLs are validated as `http`/`https` at load time.

use crate::logging::default_log_level;
use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_API_URL: &str = "TASKFLOW_API_URL";
pub const ENV_AUTH_URL: &str = "TASKFLOW_AUTH_URL";
pub const ENV_AUTH_ANON_KEY: &str = "TASKFLOW_AUTH_ANON_KEY";
pub const ENV_DEMO_FALLBACK: &str = "TASKFLOW_DEMO_FALLBACK";
pub const ENV_DB_PATH: &str = "TASKFLOW_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKFLOW_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKFLOW_LOG_DIR";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_DB_FILE_NAME: &str = "taskflow.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "taskflow-logs";

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable unset or blank.
    Missing(&'static str),
    /// Variable set but unusable.
    Invalid { name: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing required setting `{name}`"),
            Self::Invalid { name, reason } => write!(f, "invalid setting `{name}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Whether task listing may substitute the demo dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoFallback {
    /// Failures surface as errors.
    #[default]
    Disabled,
    /// An unreachable backend yields the demo dataset instead.
    WhenUnreachable,
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub auth_url: Url,
    pub auth_anon_key: String,
    pub demo_fallback: DemoFallback,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl ClientConfig {
    /// Loads settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary lookup (tests, config files).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_base_url = parse_http_url(
            ENV_API_URL,
            read(ENV_API_URL)
                .as_deref()
                .unwrap_or(DEFAULT_API_URL),
        )?;
        let auth_url = parse_http_url(
            ENV_AUTH_URL,
            read(ENV_AUTH_URL)
                .ok_or(ConfigError::Missing(ENV_AUTH_URL))?
                .as_str(),
        )?;
        let auth_anon_key = read(ENV_AUTH_ANON_KEY).ok_or(ConfigError::Missing(ENV_AUTH_ANON_KEY))?;

        let demo_fallback = match read(ENV_DEMO_FALLBACK) {
            None => DemoFallback::Disabled,
            Some(raw) => {
                if parse_bool(ENV_DEMO_FALLBACK, &raw)? {
                    DemoFallback::WhenUnreachable
                } else {
                    DemoFallback::Disabled
                }
            }
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
        let log_level = read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = read(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));

        Ok(Self {
            api_base_url,
            auth_url,
            auth_anon_key,
            demo_fallback,
            db_path,
            log_level,
            log_dir,
        })
    }
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|err| ConfigError::Invalid {
        name,
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}
