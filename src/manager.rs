use std::cell::{Ref, RefCell};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::filter::ViewFilter;
use crate::gateway::{Envelope, TodoGateway};
use crate::models::Task;
use crate::state::TaskList;

pub const LOGOUT_PROMPT: &str = "Do you really want to logout?";

/// What happened to a request issued through [`TaskManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway confirmed the change and the view was reconciled.
    Confirmed,
    /// Rejected locally; nothing was sent.
    Skipped,
    /// The gateway call failed; the failure was logged.
    Failed,
    /// A fetch resolved after a newer one was issued and was ignored.
    Discarded,
}

/// How the view is reconciled after a confirmed create.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AddPolicy {
    /// Always re-fetch the current view.
    #[default]
    Refetch,
    /// Append the created task when it belongs to the current view and nothing
    /// else touched the view meanwhile; otherwise re-fetch.
    AppendWhenVisible,
}

/// A yes/no decision supplied by the UI layer.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Mediates every mutation of the current view through the gateway.
///
/// Operations take `&self` so several can be in flight on one thread; the list
/// borrow is never held across an await.
pub struct TaskManager<G> {
    gateway: G,
    list: RefCell<TaskList>,
    add_policy: AddPolicy,
}

impl<G: TodoGateway> TaskManager<G> {
    pub fn new(gateway: G) -> Self {
        TaskManager {
            gateway,
            list: RefCell::new(TaskList::new()),
            add_policy: AddPolicy::default(),
        }
    }

    pub fn with_add_policy(mut self, policy: AddPolicy) -> Self {
        self.add_policy = policy;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn list(&self) -> Ref<'_, TaskList> {
        self.list.borrow()
    }

    pub fn filter(&self) -> ViewFilter {
        self.list.borrow().filter()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.list.borrow().tasks().to_vec()
    }

    /// Fetches `filter` and makes it the current view.
    pub async fn load(&self, filter: ViewFilter) -> Outcome {
        let ticket = self.list.borrow_mut().begin_load(filter);
        debug!(%filter, seq = ticket.seq(), "fetching view");

        let envelope = self.gateway.list(filter.query()).await;
        let result = if envelope.success {
            Some(decode_tasks(&envelope))
        } else {
            warn!(%filter, status = ?envelope.status, error = ?envelope.error_message(), "failed to fetch tasks");
            None
        };
        let failed = result.is_none();

        if !self.list.borrow_mut().resolve(ticket, result) {
            debug!(%filter, seq = ticket.seq(), "discarding stale fetch");
            return Outcome::Discarded;
        }
        if failed {
            Outcome::Failed
        } else {
            Outcome::Confirmed
        }
    }

    /// Whether a row action picked in `view` may still run. The current view
    /// changes as soon as a newer fetch is issued.
    fn acting_in(&self, view: ViewFilter, op: &str, id: &str) -> bool {
        let current = self.filter();
        if current != view {
            debug!(op, id, %view, %current, "view changed before the action ran");
            return false;
        }
        true
    }

    async fn reload(&self) {
        let filter = self.filter();
        self.load(filter).await;
    }

    pub async fn add(&self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Skipped;
        }

        let issued_at = self.list.borrow().issued();
        let envelope = self.gateway.create(text).await;
        let created = match confirmed_task(&envelope) {
            Some(task) => task,
            None => {
                log_failure("add", None, &envelope);
                return Outcome::Failed;
            }
        };
        info!(id = %created.id, "task created");

        if self.add_policy == AddPolicy::AppendWhenVisible
            && self.list.borrow_mut().append_confirmed(issued_at, created)
        {
            return Outcome::Confirmed;
        }
        self.reload().await;
        Outcome::Confirmed
    }

    /// Flips completion of a task listed in `view`. Trash rows cannot be toggled.
    pub async fn toggle_complete(&self, view: ViewFilter, id: &str) -> Outcome {
        if view == ViewFilter::Trash || !self.acting_in(view, "toggle", id) {
            return Outcome::Skipped;
        }
        let (text, completed) = match self.list.borrow().find(id) {
            Some(t) => (t.text.clone(), t.completed),
            None => {
                debug!(id, "toggle for a task not in view");
                return Outcome::Skipped;
            }
        };

        let envelope = self.gateway.update(id, &text, Some(!completed)).await;
        if confirmed_task(&envelope).is_none() {
            log_failure("toggle", Some(id), &envelope);
            return Outcome::Failed;
        }
        self.reload().await;
        Outcome::Confirmed
    }

    pub async fn edit(&self, id: &str, new_text: &str) -> Outcome {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return Outcome::Skipped;
        }
        let completed = match self.list.borrow().find(id) {
            Some(t) if t.text == new_text => return Outcome::Skipped,
            Some(t) => t.completed,
            None => return Outcome::Skipped,
        };

        let envelope = self.gateway.update(id, new_text, Some(completed)).await;
        if confirmed_task(&envelope).is_none() {
            log_failure("edit", Some(id), &envelope);
            return Outcome::Failed;
        }
        self.reload().await;
        Outcome::Confirmed
    }

    /// Permanent when acting from the trash view, soft everywhere else. Skipped
    /// when the current view is no longer `view`.
    pub async fn delete(&self, view: ViewFilter, id: &str) -> Outcome {
        if !self.acting_in(view, "delete", id) {
            return Outcome::Skipped;
        }
        let permanent = view == ViewFilter::Trash;
        let envelope = if permanent {
            self.gateway.delete_permanent(id).await
        } else {
            self.gateway.soft_delete(id).await
        };

        // A task the gateway no longer knows is as gone as a deleted one.
        if !envelope.success && envelope.status != Some(404) {
            log_failure("delete", Some(id), &envelope);
            return Outcome::Failed;
        }
        info!(id, permanent, "task deleted");
        self.reload().await;
        Outcome::Confirmed
    }

    pub async fn restore(&self, view: ViewFilter, id: &str) -> Outcome {
        if view != ViewFilter::Trash || !self.acting_in(view, "restore", id) {
            return Outcome::Skipped;
        }
        let envelope = self.gateway.restore(id).await;
        if !envelope.success {
            log_failure("restore", Some(id), &envelope);
            return Outcome::Failed;
        }
        info!(id, "task restored");
        self.reload().await;
        Outcome::Confirmed
    }

    /// Ends the session after confirmation. The local state is cleared even if
    /// the gateway call fails.
    pub async fn logout(&self, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm(LOGOUT_PROMPT) {
            return Outcome::Skipped;
        }
        let envelope = self.gateway.logout().await;
        if !envelope.success {
            warn!(status = ?envelope.status, error = ?envelope.error_message(), "logout call failed; clearing session anyway");
        }
        self.list.borrow_mut().clear();
        info!("logged out");
        Outcome::Confirmed
    }
}

/// Decodes `data.todos` entry by entry; an entry that does not decode is
/// logged and left out instead of emptying the view.
fn decode_tasks(envelope: &Envelope) -> Vec<Task> {
    let Some(entries) = envelope.field::<Vec<Value>>("todos") else {
        if envelope.data.as_ref().is_some_and(|d| d.get("todos").is_some_and(|t| !t.is_null())) {
            warn!("task list response has a malformed `todos` field");
        }
        return Vec::new();
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Task>(entry) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index, error = %e, "skipping task that failed to decode");
                None
            }
        })
        .collect()
}

fn confirmed_task(envelope: &Envelope) -> Option<Task> {
    if !envelope.success {
        return None;
    }
    envelope.field::<Task>("todo")
}

fn log_failure(op: &str, id: Option<&str>, envelope: &Envelope) {
    warn!(
        op,
        id = id.unwrap_or("-"),
        status = ?envelope.status,
        error = ?envelope.error_message(),
        "task operation failed"
    );
}
