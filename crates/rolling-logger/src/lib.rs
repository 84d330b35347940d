//! Rolling Logger
//!
//! Process-wide logger for todo-sync:
//! - stderr output for interactive use
//! - size-rotated log file in a log directory
//! - in-memory circular buffer of recent events
//!
//! `log` records are bridged into `tracing`, so library code can keep
//! using the `log` macros.

mod buffer;
mod writer;

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use buffer::{BufferLayer, LogBuffer, LogEntry, SharedLogBuffer};
pub use tracing::Level;
pub use writer::RollingFileWriter;

/// Maximum size of the live log file before rotation
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Number of rotated backups kept next to the live file
pub const DEFAULT_MAX_FILES: usize = 3;
/// Number of events kept in memory
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
    #[error("logger not initialized")]
    NotInitialized,
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub app_name: String,
    pub max_bytes: u64,
    pub max_files: usize,
    pub buffer_capacity: usize,
    /// Also write to stderr
    pub stderr: bool,
}

impl LoggerConfig {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            stderr: true,
        }
    }
}

static BUFFER: OnceLock<SharedLogBuffer> = OnceLock::new();

/// Initialize the global logger with default settings.
///
/// Log file: `<log_dir>/<app_name>.log`.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, LoggerConfig::new(app_name))
}

pub fn init_logger_with(log_dir: impl AsRef<Path>, config: LoggerConfig) -> Result<(), LoggerError> {
    if BUFFER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let file_name = format!("{}.log", config.app_name);
    let writer = RollingFileWriter::open(log_dir.as_ref(), &file_name, config.max_bytes, config.max_files)?;
    let buffer: SharedLogBuffer = Arc::new(Mutex::new(LogBuffer::new(config.buffer_capacity)));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(move || writer.clone());
    let stderr_layer = config
        .stderr
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(BufferLayer::new(buffer.clone()))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    BUFFER
        .set(buffer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing::info!(app = %config.app_name, "logger initialized");
    Ok(())
}

fn ensure_initialized() -> Result<(), LoggerError> {
    BUFFER.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Recently captured events, oldest first. Empty before initialization.
pub fn recent_logs() -> Vec<LogEntry> {
    BUFFER
        .get()
        .and_then(|buffer| buffer.lock().ok().map(|b| b.snapshot()))
        .unwrap_or_default()
}

/// Recent events at `level` or more severe, oldest first
pub fn recent_logs_at(level: Level) -> Vec<LogEntry> {
    recent_logs()
        .into_iter()
        .filter(|entry| entry.level <= level)
        .collect()
}
