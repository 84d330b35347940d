//! Error Types
//!
//! - `SyncFailure`: a remote mutation or fetch did not complete. Always
//!   recovered locally by the synchronizer.
//! - `BootstrapFailure`: the persistence dependency is unreachable at
//!   startup. Terminal.
//! - `ConfigError`: an environment or CLI value is invalid.

use std::time::Duration;

/// A remote call to the persistence endpoint did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncFailure {
    #[error("network error: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
}

impl SyncFailure {
    /// Classify a reqwest error. `timeout` is the deadline the caller armed,
    /// reported back when reqwest gave up on it.
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            SyncFailure::Timeout(timeout)
        } else if error.is_decode() {
            SyncFailure::Malformed(error_chain(&error))
        } else if let Some(status) = error.status() {
            SyncFailure::Status(status.as_u16())
        } else {
            SyncFailure::Transport(error_chain(&error))
        }
    }
}

/// `error` followed by each of its causes, joined with ": "
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Some wrappers already repeat their cause in Display
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Persistence connectivity could not be established at startup
#[derive(Debug, thiserror::Error)]
pub enum BootstrapFailure {
    #[error("invalid connection string: {0}")]
    InvalidUri(String),
    #[error("cannot reach {address}: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("timed out connecting to {address} after {timeout:?}")]
    Timeout { address: String, timeout: Duration },
}

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_matches_alert_text() {
        assert_eq!(SyncFailure::Status(500).to_string(), "HTTP error! status: 500");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_causes() {
        let error = Outer(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert_eq!(error_chain(&error), "error sending request: connection refused");
    }

    #[test]
    fn test_error_chain_skips_repeated_cause() {
        #[derive(Debug, thiserror::Error)]
        #[error("connect failed: connection refused")]
        struct Repeating(#[source] std::io::Error);

        let error = Repeating(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert_eq!(error_chain(&error), "connect failed: connection refused");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("TODO_RECONCILE", "expected confirmed or optimistic");
        assert_eq!(
            err.to_string(),
            "Invalid value for TODO_RECONCILE: expected confirmed or optimistic"
        );
    }
}
