use crate::models::Task;

/// An edit that should be sent to [`crate::manager::TaskManager::edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCommit {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct ActiveEdit {
    id: String,
    original: String,
    buffer: String,
}

/// Inline editing state for at most one task.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    active: Option<ActiveEdit>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters edit mode for `task`. An edit already open on another task loses
    /// focus and is committed; that commit is returned.
    pub fn start(&mut self, task: &Task) -> Option<EditCommit> {
        if self.is_editing(&task.id) {
            return None;
        }
        let previous = self.commit();
        self.active = Some(ActiveEdit {
            id: task.id.clone(),
            original: task.text.clone(),
            buffer: task.text.clone(),
        });
        previous
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.active.as_ref().is_some_and(|a| a.id == id)
    }

    pub fn buffer(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.buffer.as_str())
    }

    pub fn insert(&mut self, c: char) {
        if let Some(a) = self.active.as_mut() {
            a.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(a) = self.active.as_mut() {
            a.buffer.pop();
        }
    }

    /// Leaves edit mode. Yields a commit only when the buffer is non-blank and
    /// differs from the text the session started with.
    pub fn commit(&mut self) -> Option<EditCommit> {
        let active = self.active.take()?;
        let text = active.buffer.trim();
        if text.is_empty() || text == active.original {
            return None;
        }
        Some(EditCommit {
            id: active.id,
            text: text.to_string(),
        })
    }

    /// Leaves edit mode and throws the buffer away.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
