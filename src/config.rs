//! Client Configuration
//!
//! Loaded once at startup from the environment (and `.env` when present).
//!
//! - `BACKEND_URL`: todo service base URL (default `http://localhost:5000`)
//! - `TODO_REQUEST_TIMEOUT_MS`: per-request timeout (default 10000)
//! - `TODO_RECONCILE`: `confirmed` or `optimistic` (default `confirmed`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// When local state is allowed to change relative to the server round-trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Change local state only after the service accepted the update
    #[default]
    Confirmed,
    /// Change local state immediately, roll back if the update fails
    Optimistic,
}

impl ReconcilePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcilePolicy::Confirmed => "confirmed",
            ReconcilePolicy::Optimistic => "optimistic",
        }
    }
}

impl FromStr for ReconcilePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(ReconcilePolicy::Confirmed),
            "optimistic" => Ok(ReconcilePolicy::Optimistic),
            other => Err(ConfigError::invalid(
                "TODO_RECONCILE",
                format!("expected confirmed or optimistic, got {:?}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub policy: ReconcilePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            policy: ReconcilePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend_url = lookup("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        validate_url("BACKEND_URL", &backend_url)?;

        let request_timeout = match lookup("TODO_REQUEST_TIMEOUT_MS") {
            Some(raw) => parse_timeout_ms("TODO_REQUEST_TIMEOUT_MS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let policy = match lookup("TODO_RECONCILE") {
            Some(raw) => raw.parse()?,
            None => ReconcilePolicy::default(),
        };

        Ok(Self {
            backend_url,
            request_timeout,
            policy,
        })
    }
}

pub(crate) fn validate_url(key: &str, raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(key, format!("unsupported scheme {}", other))),
    }
}

pub(crate) fn parse_timeout_ms(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::invalid(key, e.to_string()))?;
    if ms == 0 {
        return Err(ConfigError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}
