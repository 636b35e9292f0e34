//! Observable task state
//!
//! One tagged record per view instead of independent loading/error flags, so
//! "failed but still showing data" or "loading with no notion of previous
//! data" cannot be expressed by accident.

use serde::Serialize;

use crate::task::{Task, TaskStats};

/// The last successful server read, split for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskLists {
    pub pending: Vec<Task>,
    /// Most recently completed first
    pub completed: Vec<Task>,
}

impl TaskLists {
    /// Split a server read into pending and completed tasks.
    ///
    /// Pending tasks keep server order. Completed tasks are ordered by
    /// `completedAt`, newest first; tasks without one sort last and keep their
    /// relative order.
    pub fn partition(tasks: Vec<Task>) -> Self {
        let (mut completed, pending): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(|task| task.completed);
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Self { pending, completed }
    }

    /// Pending tasks followed by completed tasks
    pub fn all(&self) -> Vec<Task> {
        self.pending
            .iter()
            .chain(self.completed.iter())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(self.pending.iter().chain(self.completed.iter()))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.pending.iter().chain(self.completed.iter()).any(|t| t.id == id)
    }
}

/// State of the task list as presented to readers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewState {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// A fetch is in flight; `lists` is whatever was shown before it started
    /// and must not be trusted for emptiness decisions
    Loading {
        lists: TaskLists,
        error: Option<String>,
    },
    /// Lists reflect the last successful server read
    Ready {
        lists: TaskLists,
        error: Option<String>,
    },
    /// The last fetch failed; nothing stale is shown
    Failed { error: String },
}

static EMPTY: TaskLists = TaskLists {
    pending: Vec::new(),
    completed: Vec::new(),
};

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn lists(&self) -> &TaskLists {
        match self {
            Self::Loading { lists, .. } | Self::Ready { lists, .. } => lists,
            Self::Idle | Self::Failed { .. } => &EMPTY,
        }
    }

    pub fn pending(&self) -> &[Task] {
        &self.lists().pending
    }

    pub fn completed(&self) -> &[Task] {
        &self.lists().completed
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Loading { error, .. } | Self::Ready { error, .. } => error.as_deref(),
            Self::Failed { error } => Some(error),
            Self::Idle => None,
        }
    }

    fn take_lists(&mut self) -> TaskLists {
        match self {
            Self::Loading { lists, .. } | Self::Ready { lists, .. } => std::mem::take(lists),
            Self::Idle | Self::Failed { .. } => TaskLists::default(),
        }
    }

    fn take_error(&mut self) -> Option<String> {
        match self {
            Self::Loading { error, .. } | Self::Ready { error, .. } => error.take(),
            Self::Failed { error } => Some(std::mem::take(error)),
            Self::Idle => None,
        }
    }

    /// A fetch started; keep showing the previous lists and error.
    pub(crate) fn begin_loading(&mut self) {
        let lists = self.take_lists();
        let error = self.take_error();
        *self = Self::Loading { lists, error };
    }

    /// A fetch succeeded. Clears the error. Stays loading while other
    /// fetches are still outstanding.
    pub(crate) fn apply_lists(&mut self, lists: TaskLists, still_loading: bool) {
        *self = if still_loading {
            Self::Loading { lists, error: None }
        } else {
            Self::Ready { lists, error: None }
        };
    }

    /// A fetch failed. Both lists are emptied.
    pub(crate) fn fail_fetch(&mut self, message: String, still_loading: bool) {
        *self = if still_loading {
            Self::Loading {
                lists: TaskLists::default(),
                error: Some(message),
            }
        } else {
            Self::Failed { error: message }
        };
    }

    /// The last outstanding fetch went away without resolving; whatever was
    /// shown before it stays.
    pub(crate) fn settle(&mut self) {
        if self.is_loading() {
            let lists = self.take_lists();
            let error = self.take_error();
            *self = Self::Ready { lists, error };
        }
    }

    /// A mutation failed. Lists are left as they are.
    pub(crate) fn record_error(&mut self, message: String) {
        match self {
            Self::Loading { error, .. } | Self::Ready { error, .. } => *error = Some(message),
            Self::Failed { error } => *error = message,
            Self::Idle => *self = Self::Failed { error: message },
        }
    }
}
