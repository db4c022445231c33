#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use todust::gateway::{Envelope, TodoGateway, TodoQuery};
use todust::models::{Credentials, Registration, Task};

#[derive(Debug, Clone)]
struct Stored {
    task: Task,
    deleted: bool,
}

/// In-memory stand-in for the backend, with the same filter semantics.
#[derive(Default)]
pub struct MemoryGateway {
    tasks: Mutex<Vec<Stored>>,
    next_id: AtomicUsize,
    authenticated: Mutex<bool>,
    /// Artificial latency per list query, for ordering tests.
    list_delays: Mutex<HashMap<Option<TodoQuery>, Duration>>,
    fail_ops: Mutex<Vec<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        let gw = MemoryGateway::default();
        *gw.authenticated.lock().unwrap() = true;
        gw
    }

    pub fn logged_out() -> Self {
        MemoryGateway::default()
    }

    pub fn with_task(self, text: &str, completed: bool) -> Self {
        self.insert(text, completed, false);
        self
    }

    pub fn with_deleted(self, text: &str, completed: bool) -> Self {
        self.insert(text, completed, true);
        self
    }

    fn insert(&self, text: &str, completed: bool, deleted: bool) -> String {
        let id = format!("t{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.tasks.lock().unwrap().push(Stored {
            task: Task {
                id: id.clone(),
                text: text.to_string(),
                completed,
                created_at: None,
            },
            deleted,
        });
        id
    }

    pub fn id_of(&self, text: &str) -> String {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.task.text == text)
            .map(|s| s.task.id.clone())
            .expect("task present")
    }

    pub fn delay_list(&self, query: Option<TodoQuery>, delay: Duration) {
        self.list_delays.lock().unwrap().insert(query, delay);
    }

    /// Makes every call of `op` fail with a 500 envelope.
    pub fn fail(&self, op: &'static str) {
        self.fail_ops.lock().unwrap().push(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.lock().unwrap()
    }

    fn record(&self, op: &'static str) -> Option<Envelope> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.fail_ops.lock().unwrap().contains(&op) {
            return Some(Envelope::failure(Some(500), Some(json!({"error": "boom"})), "boom"));
        }
        None
    }

    fn not_found() -> Envelope {
        Envelope::failure(Some(404), Some(json!({"error": "Todo not found"})), "Todo not found")
    }
}

#[async_trait]
impl TodoGateway for MemoryGateway {
    async fn probe_session(&self) -> Envelope {
        if let Some(e) = self.record("probe") {
            return e;
        }
        if self.is_authenticated() {
            Envelope::ok(200, Some(json!({"user": {"email": "me@example.com"}})))
        } else {
            Envelope::failure(Some(401), Some(json!({"error": "Unauthorized"})), "Unauthorized")
        }
    }

    async fn login(&self, credentials: &Credentials) -> Envelope {
        if let Some(e) = self.record("login") {
            return e;
        }
        if credentials.password == "Right#Pass1" {
            *self.authenticated.lock().unwrap() = true;
            Envelope::ok(200, Some(json!({"message": "ok"})))
        } else {
            Envelope::failure(
                Some(401),
                Some(json!({"error": "Invalid credentials"})),
                "Invalid credentials",
            )
        }
    }

    async fn register(&self, _registration: &Registration) -> Envelope {
        if let Some(e) = self.record("register") {
            return e;
        }
        Envelope::ok(201, Some(json!({"message": "created"})))
    }

    async fn logout(&self) -> Envelope {
        if let Some(e) = self.record("logout") {
            return e;
        }
        *self.authenticated.lock().unwrap() = false;
        Envelope::ok(200, None)
    }

    async fn list(&self, query: Option<TodoQuery>) -> Envelope {
        let delay = self.list_delays.lock().unwrap().get(&query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.record("list") {
            return e;
        }
        let todos: Vec<Task> = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| match query {
                None => !s.deleted,
                Some(TodoQuery::Active) => !s.deleted && !s.task.completed,
                Some(TodoQuery::Completed) => !s.deleted && s.task.completed,
                Some(TodoQuery::Deleted) => s.deleted,
            })
            .map(|s| s.task.clone())
            .collect();
        Envelope::ok(200, Some(json!({ "todos": todos })))
    }

    async fn create(&self, text: &str) -> Envelope {
        if let Some(e) = self.record("create") {
            return e;
        }
        let id = self.insert(text, false, false);
        let task = self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.task.id == id)
            .map(|s| s.task.clone());
        Envelope::ok(201, Some(json!({ "todo": task })))
    }

    async fn update(&self, id: &str, text: &str, completed: Option<bool>) -> Envelope {
        if let Some(e) = self.record("update") {
            return e;
        }
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|s| s.task.id == id && !s.deleted) {
            Some(s) => {
                s.task.text = text.to_string();
                if let Some(c) = completed {
                    s.task.completed = c;
                }
                Envelope::ok(200, Some(json!({ "todo": s.task })))
            }
            None => Self::not_found(),
        }
    }

    async fn soft_delete(&self, id: &str) -> Envelope {
        if let Some(e) = self.record("soft_delete") {
            return e;
        }
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|s| s.task.id == id && !s.deleted) {
            Some(s) => {
                s.deleted = true;
                Envelope::ok(200, Some(json!({"message": "moved to trash"})))
            }
            None => Self::not_found(),
        }
    }

    async fn delete_permanent(&self, id: &str) -> Envelope {
        if let Some(e) = self.record("delete_permanent") {
            return e;
        }
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|s| s.task.id != id);
        if tasks.len() == before {
            Self::not_found()
        } else {
            Envelope::ok(200, Some(json!({"message": "deleted"})))
        }
    }

    async fn restore(&self, id: &str) -> Envelope {
        if let Some(e) = self.record("restore") {
            return e;
        }
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter_mut().find(|s| s.task.id == id && s.deleted) {
            Some(s) => {
                s.deleted = false;
                Envelope::ok(200, Some(json!({ "todo": s.task })))
            }
            None => Self::not_found(),
        }
    }
}

pub fn texts(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.text.clone()).collect()
}
