//! Persistence Bootstrap
//!
//! Verifies at startup that the document store named by `MONGO_URI` is
//! reachable. A failure here is terminal: the process must not serve
//! anything against a broken dependency.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use url::{Host, Url};

use crate::config::parse_timeout_ms;
use crate::error::{BootstrapFailure, ConfigError};

pub const MONGO_URI_ENV: &str = "MONGO_URI";
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/todo-db";
pub const DEFAULT_MONGO_PORT: u16 = 27017;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub uri: String,
    pub connect_timeout: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl PersistenceConfig {
    /// `MONGO_URI` from the environment, then `.env`, then the built-in default
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let uri = lookup(MONGO_URI_ENV)
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MONGO_URI.to_string());

        let connect_timeout = match lookup("MONGO_CONNECT_TIMEOUT_MS") {
            Some(raw) => parse_timeout_ms("MONGO_CONNECT_TIMEOUT_MS", &raw)?,
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        Ok(Self { uri, connect_timeout })
    }
}

/// Where the document store lives. Credentials are never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEndpoint {
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
}

impl DbEndpoint {
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Parse a single-host `mongodb://` connection string
pub fn parse_connection_string(uri: &str) -> Result<DbEndpoint, BootstrapFailure> {
    let url = Url::parse(uri).map_err(|e| BootstrapFailure::InvalidUri(e.to_string()))?;

    if url.scheme() != "mongodb" {
        return Err(BootstrapFailure::InvalidUri(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(BootstrapFailure::InvalidUri("missing host".to_string())),
    };

    let database = Some(url.path().trim_start_matches('/'))
        .filter(|db| !db.is_empty())
        .map(str::to_string);

    Ok(DbEndpoint {
        host,
        port: url.port().unwrap_or(DEFAULT_MONGO_PORT),
        database,
    })
}

/// Establishes connectivity to the document store
#[async_trait]
pub trait DbConnector: Send + Sync {
    async fn connect(&self, endpoint: &DbEndpoint, timeout: Duration) -> Result<(), BootstrapFailure>;
}

/// Checks that the store accepts TCP connections
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl DbConnector for TcpConnector {
    async fn connect(&self, endpoint: &DbEndpoint, timeout: Duration) -> Result<(), BootstrapFailure> {
        let connect = tokio::net::TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(source)) => Err(BootstrapFailure::Unreachable {
                address: endpoint.address(),
                source,
            }),
            Err(_) => Err(BootstrapFailure::Timeout {
                address: endpoint.address(),
                timeout,
            }),
        }
    }
}

pub async fn connect_db(
    config: &PersistenceConfig,
    connector: &dyn DbConnector,
) -> Result<DbEndpoint, BootstrapFailure> {
    let result = async {
        let endpoint = parse_connection_string(&config.uri)?;
        connector.connect(&endpoint, config.connect_timeout).await?;
        Ok::<_, BootstrapFailure>(endpoint)
    }
    .await;

    match &result {
        Ok(endpoint) => log::info!(
            "Database connected successfully ({}, db={})",
            endpoint.address(),
            endpoint.database.as_deref().unwrap_or("-")
        ),
        Err(e) => log::error!("DB connection failed: {}", e),
    }
    result
}
