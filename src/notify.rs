//! Error Notifiers
//!
//! The user-facing error channel. A notifier is invoked at most once per
//! failed toggle and must never panic or fail.

use tokio::sync::mpsc;

use crate::error::SyncFailure;
use crate::models::TodoId;

/// A failed toggle, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub id: TodoId,
    pub failure: SyncFailure,
}

impl FailureNotice {
    pub fn message(&self) -> String {
        format!("Could not update todo {}: {}", self.id, self.failure)
    }
}

pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, notice: &FailureNotice);
}

/// Logs failures at error level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn notify(&self, notice: &FailureNotice) {
        log::error!("{}", notice.message());
    }
}

/// Prints an alert line to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ErrorNotifier for ConsoleNotifier {
    fn notify(&self, notice: &FailureNotice) {
        eprintln!(
            "[{}] Error: {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            notice.message()
        );
    }
}

/// Queues failures for a toast area or any other consumer
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<FailureNotice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FailureNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ErrorNotifier for ChannelNotifier {
    fn notify(&self, notice: &FailureNotice) {
        // Receiver gone means nobody is listening anymore
        if self.tx.send(notice.clone()).is_err() {
            log::debug!("dropping failure notice for {}: receiver closed", notice.id);
        }
    }
}
