use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gateway::TodoQuery;

/// The four mutually exclusive views of the task store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewFilter {
    #[default]
    All,
    Active,
    Completed,
    Trash,
}

/// Everything a renderer needs to know about a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSpec {
    pub query: Option<TodoQuery>,
    pub heading: &'static str,
    pub empty_message: &'static str,
    pub shows_add: bool,
}

impl ViewFilter {
    /// Sidebar order.
    pub const ALL: [ViewFilter; 4] = [
        ViewFilter::All,
        ViewFilter::Active,
        ViewFilter::Completed,
        ViewFilter::Trash,
    ];

    /// Parses a filter name. Anything unrecognized resolves to [`ViewFilter::All`].
    pub fn parse(s: &str) -> ViewFilter {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => ViewFilter::Active,
            "completed" => ViewFilter::Completed,
            "trash" => ViewFilter::Trash,
            _ => ViewFilter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::Active => "active",
            ViewFilter::Completed => "completed",
            ViewFilter::Trash => "trash",
        }
    }

    pub fn query(self) -> Option<TodoQuery> {
        resolve(self).query
    }

    /// Sidebar label.
    pub fn label(self) -> &'static str {
        match self {
            ViewFilter::All => "All Tasks",
            ViewFilter::Active => "Active",
            ViewFilter::Completed => "Completed",
            ViewFilter::Trash => "Trash",
        }
    }

    /// Line shown under the heading, e.g. `You have 2 active tasks`.
    pub fn summary(self, count: usize) -> String {
        let plural = if count == 1 { "" } else { "s" };
        match self {
            ViewFilter::Trash => "Deleted tasks are stored here".to_string(),
            ViewFilter::All => format!("You have {count} task{plural}"),
            other => format!("You have {count} {} task{plural}", other.as_str()),
        }
    }

    /// Whether a freshly created task (not completed, not deleted) belongs to this view.
    pub fn admits_new_task(self) -> bool {
        matches!(self, ViewFilter::All | ViewFilter::Active)
    }

    pub fn next(self) -> ViewFilter {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> ViewFilter {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl From<&str> for ViewFilter {
    fn from(s: &str) -> Self {
        ViewFilter::parse(s)
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a filter to its gateway query and presentation strings.
pub fn resolve(filter: ViewFilter) -> ViewSpec {
    match filter {
        ViewFilter::All => ViewSpec {
            query: None,
            heading: "My Tasks",
            empty_message: "No tasks yet! Add one to get started.",
            shows_add: true,
        },
        ViewFilter::Active => ViewSpec {
            query: Some(TodoQuery::Active),
            heading: "Active Tasks",
            empty_message: "No active tasks",
            shows_add: true,
        },
        ViewFilter::Completed => ViewSpec {
            query: Some(TodoQuery::Completed),
            heading: "Completed Tasks",
            empty_message: "No completed tasks yet",
            shows_add: true,
        },
        ViewFilter::Trash => ViewSpec {
            query: Some(TodoQuery::Deleted),
            heading: "Trash",
            empty_message: "No deleted tasks",
            shows_add: false,
        },
    }
}
