use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single task as the gateway reports it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "WireTask")]
pub struct Task {
    /// Opaque server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// The text content of the task.
    #[serde(rename = "task")]
    pub text: String,
    /// Whether the task has been completed.
    pub completed: bool,
    /// Creation timestamp, when the gateway sends one.
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Task as it arrives on the wire. The id may come as `_id`, `id`, or both;
/// a timestamp that is not RFC 3339 is dropped rather than failing the task.
#[derive(Deserialize)]
struct WireTask {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    task: String,
    #[serde(default)]
    completed: bool,
    #[serde(default, rename = "createdAt")]
    created_at: Option<Value>,
}

impl TryFrom<WireTask> for Task {
    type Error = String;

    fn try_from(wire: WireTask) -> Result<Self, Self::Error> {
        let id = wire
            .mongo_id
            .or(wire.id)
            .ok_or_else(|| "task has neither `_id` nor `id`".to_string())?;
        let created_at = wire
            .created_at
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        Ok(Task {
            id,
            text: wire.task,
            completed: wire.completed,
            created_at,
        })
    }
}

/// Body of `POST /todos`.
#[derive(Serialize, Debug, Clone)]
pub struct NewTask<'a> {
    pub task: &'a str,
}

/// Body of `PUT /todos/:id`.
#[derive(Serialize, Debug, Clone)]
pub struct TaskUpdate<'a> {
    pub task: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Body of `POST /auth/login`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}
