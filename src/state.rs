use crate::filter::ViewFilter;
use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; the collection is empty and renders like `Ready`.
    Failed,
}

/// Handed out by [`TaskList::begin_load`] and checked again when the fetch resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    filter: ViewFilter,
}

impl FetchTicket {
    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Local copy of the current view's tasks.
///
/// Only the most recently issued fetch may write the collection; responses to
/// earlier fetches are dropped regardless of the order they arrive in.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    filter: ViewFilter,
    tasks: Vec<Task>,
    phase: LoadPhase,
    issued: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Sequence number of the latest fetch issued.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn begin_load(&mut self, filter: ViewFilter) -> FetchTicket {
        self.issued += 1;
        if filter != self.filter {
            self.tasks.clear();
        }
        self.filter = filter;
        self.phase = LoadPhase::Loading;
        FetchTicket {
            seq: self.issued,
            filter,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.seq == self.issued && ticket.filter == self.filter
    }

    /// Applies a fetch result. `None` is a failed fetch and empties the view.
    /// Returns `false` when the ticket is stale and nothing changed.
    pub fn resolve(&mut self, ticket: FetchTicket, result: Option<Vec<Task>>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match result {
            Some(tasks) => {
                self.tasks = tasks;
                self.phase = LoadPhase::Ready;
            }
            None => {
                self.tasks.clear();
                self.phase = LoadPhase::Failed;
            }
        }
        true
    }

    /// Appends a confirmed task, if the view has not been re-fetched since `seq`.
    pub fn append_confirmed(&mut self, seq: u64, task: Task) -> bool {
        let settled = matches!(self.phase, LoadPhase::Ready | LoadPhase::Failed);
        if seq != self.issued || !settled || !self.filter.admits_new_task() {
            return false;
        }
        if self.find(&task.id).is_none() {
            self.tasks.push(task);
        }
        self.phase = LoadPhase::Ready;
        true
    }

    /// Back to `Idle` with nothing loaded. Fetches still in flight become stale.
    pub fn clear(&mut self) {
        self.issued += 1;
        self.tasks.clear();
        self.filter = ViewFilter::All;
        self.phase = LoadPhase::Idle;
    }
}
