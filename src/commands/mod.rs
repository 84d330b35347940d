//! Persistence Endpoint Commands
//!
//! Client bindings to the todo service, organized by resource.

mod todo;

use async_trait::async_trait;

use crate::error::SyncFailure;
use crate::models::TodoItem;

pub use todo::*;

/// Remote todo service as seen by the client
#[async_trait]
pub trait TodoEndpoint: Send + Sync {
    /// Apply a partial update. Any 2xx is success; the body is ignored.
    ///
    /// Implementations need not bound the call as a whole: the caller
    /// wraps it in its own deadline.
    async fn update_todo(&self, request: &UpdateTodoRequest) -> Result<(), SyncFailure>;

    /// Fetch the full todo list
    async fn list_todos(&self) -> Result<Vec<TodoItem>, SyncFailure>;
}
