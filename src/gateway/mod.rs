//! The remote task gateway as the rest of the crate sees it.
//!
//! Every call resolves to an [`Envelope`], never an error: transport failures and
//! non-2xx responses both arrive as `success == false`.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Credentials, Registration};

/// Normalized result of a gateway call.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub success: bool,
    pub data: Option<Value>,
    pub message: Option<String>,
    pub status: Option<u16>,
}

impl Envelope {
    pub fn ok(status: u16, data: Option<Value>) -> Self {
        Envelope {
            success: true,
            data,
            message: None,
            status: Some(status),
        }
    }

    pub fn failure(status: Option<u16>, data: Option<Value>, message: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data,
            message: Some(message.into()),
            status,
        }
    }

    /// Decodes `data[key]`, returning `None` when it is absent or malformed.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.data.as_ref()?.get(key)?;
        if value.is_null() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// The server's `error` text if it sent one, else the transport message.
    pub fn error_message(&self) -> Option<String> {
        self.field::<String>("error").or_else(|| self.message.clone())
    }
}

/// Server-side subsets a task list can be fetched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TodoQuery {
    Active,
    Completed,
    Deleted,
}

impl TodoQuery {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoQuery::Active => "active",
            TodoQuery::Completed => "completed",
            TodoQuery::Deleted => "deleted",
        }
    }
}

/// Path segments of the list endpoint for a query (`None` lists every non-deleted task).
pub fn list_segments(query: Option<TodoQuery>) -> Vec<&'static str> {
    match query {
        None => vec!["todos"],
        Some(q) => vec!["todos", q.as_str()],
    }
}

#[async_trait]
pub trait TodoGateway: Send + Sync {
    /// `GET /auth/login`; success means the session is authenticated.
    async fn probe_session(&self) -> Envelope;

    async fn login(&self, credentials: &Credentials) -> Envelope;

    async fn register(&self, registration: &Registration) -> Envelope;

    async fn logout(&self) -> Envelope;

    /// Lists tasks; the collection is expected under `data.todos`.
    async fn list(&self, query: Option<TodoQuery>) -> Envelope;

    /// Creates a task; the created task is expected under `data.todo`.
    async fn create(&self, text: &str) -> Envelope;

    /// Updates a task; the updated task is expected under `data.todo`.
    async fn update(&self, id: &str, text: &str, completed: Option<bool>) -> Envelope;

    async fn soft_delete(&self, id: &str) -> Envelope;

    async fn delete_permanent(&self, id: &str) -> Envelope;

    async fn restore(&self, id: &str) -> Envelope;

    /// Session cookie that can be handed back to a later client.
    fn session_cookie(&self) -> Option<String> {
        None
    }
}
