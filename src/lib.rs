//! todo-sync
//!
//! Todo list client that keeps a local collection in step with a remote
//! todo service.
//!
//! Layers:
//! - models / store: todo items and the session-owned collection
//! - commands: request builder and HTTP binding to the service
//! - sync: toggle protocol (in-flight tracking, reconciliation, failures)
//! - bootstrap: startup check of the persistence dependency

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod notify;
pub mod store;
pub mod sync;

pub use commands::{HttpTodoEndpoint, TodoEndpoint, UpdateTodoRequest};
pub use config::{ClientConfig, ReconcilePolicy};
pub use error::{BootstrapFailure, ConfigError, SyncFailure};
pub use models::{TodoId, TodoItem};
pub use store::{TodoCollection, TodoStore};
pub use sync::{ToggleOutcome, ToggleSynchronizer};
