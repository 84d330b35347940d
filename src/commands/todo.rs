//! Todo Commands
//!
//! Request builder for the completion update plus the HTTP binding to the
//! todo service (`PUT /todos/{id}`, `GET /todos`).

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method};
use serde::Serialize;

use super::TodoEndpoint;
use crate::error::{error_chain, SyncFailure};
use crate::models::{TodoId, TodoItem};

/// Characters left as-is in a path segment (RFC 3986 unreserved)
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// ========================
// Request Builder
// ========================

/// JSON body of the completion update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTodoBody {
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
}

/// Partial update of one todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTodoRequest {
    pub id: TodoId,
    pub body: UpdateTodoBody,
}

impl UpdateTodoRequest {
    pub const METHOD: Method = Method::PUT;

    /// Path relative to the service base, id encoded as one segment
    pub fn path(&self) -> String {
        format!("/todos/{}", utf8_percent_encode(self.id.as_str(), PATH_SEGMENT))
    }
}

pub fn build_update_request(id: &TodoId, is_completed: bool) -> UpdateTodoRequest {
    UpdateTodoRequest {
        id: id.clone(),
        body: UpdateTodoBody { is_completed },
    }
}

/// Request that flips `item`'s completion flag
pub fn toggle_request(item: &TodoItem) -> UpdateTodoRequest {
    build_update_request(&item.id, !item.is_completed)
}

// ========================
// HTTP Binding
// ========================

/// reqwest binding to the todo service.
///
/// `timeout` bounds connecting and the whole list fetch. Updates only get
/// the connect bound: the synchronizer owns their overall deadline.
pub struct HttpTodoEndpoint {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTodoEndpoint {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncFailure> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| SyncFailure::Transport(error_chain(&e)))?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    pub fn with_client(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn failure(&self, error: reqwest::Error) -> SyncFailure {
        SyncFailure::from_reqwest(error, self.timeout)
    }
}

#[async_trait]
impl TodoEndpoint for HttpTodoEndpoint {
    async fn update_todo(&self, request: &UpdateTodoRequest) -> Result<(), SyncFailure> {
        let url = self.url(&request.path());
        log::debug!("{} {} {:?}", UpdateTodoRequest::METHOD, url, request.body);

        let response = self
            .client
            .request(UpdateTodoRequest::METHOD, &url)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncFailure::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<TodoItem>, SyncFailure> {
        let response = self
            .client
            .get(self.url("/todos"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.failure(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncFailure::Status(status.as_u16()));
        }
        response
            .json::<Vec<TodoItem>>()
            .await
            .map_err(|e| self.failure(e))
    }
}
