//! Task list filtering and sidebar counts
//!
//! Pure functions over a task slice. Nothing here touches the network or the
//! manager's state, so every view can be recomputed on each render.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::model::{Task, TaskPriority};

/// Number of tasks shown by the `recent` filter
pub const RECENT_WINDOW: usize = 5;

/// Sidebar filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
    High,
    Medium,
    Low,
    Recent,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 7] = [
        Self::All,
        Self::Recent,
        Self::Completed,
        Self::Pending,
        Self::High,
        Self::Medium,
        Self::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Recent => "recent",
        }
    }

    /// Whether rows come out in list order. `Recent` re-sorts by creation time.
    pub fn preserves_order(&self) -> bool {
        !matches!(self, Self::Recent)
    }

    /// Parse a filter name; anything unrecognised selects `All`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "pending" => Self::Pending,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "recent" => Self::Recent,
            _ => Self::All,
        }
    }

    fn priority(&self) -> Option<TaskPriority> {
        match self {
            Self::High => Some(TaskPriority::High),
            Self::Medium => Some(TaskPriority::Medium),
            Self::Low => Some(TaskPriority::Low),
            _ => None,
        }
    }

    fn accepts(&self, task: &Task) -> bool {
        match self {
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::High | Self::Medium | Self::Low => Some(task.priority) == self.priority(),
            Self::All | Self::Recent => true,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// The newest tasks by creation time, newest first.
///
/// The sort is stable, so tasks created at the same instant keep list order.
pub fn recent_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(RECENT_WINDOW);
    sorted
}

/// Apply a filter and a search query to a task list.
///
/// Search is applied first, then the filter. `Recent` is the exception: the
/// five-item window is cut from the full list and the search narrows that
/// window, so searching never pulls an older task into the recent view.
pub fn filter_tasks(tasks: &[Task], filter: TaskFilter, query: &str) -> Vec<Task> {
    match filter {
        TaskFilter::Recent => recent_tasks(tasks)
            .into_iter()
            .filter(|task| task.matches_query(query))
            .collect(),
        _ => tasks
            .iter()
            .filter(|task| task.matches_query(query))
            .filter(|task| filter.accepts(task))
            .cloned()
            .collect(),
    }
}

/// Per-filter counts shown in the sidebar.
///
/// Computed from the unfiltered list, independent of the active filter and search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub completed: usize,
    pub pending: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub recent: usize,
}

impl FilterCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut counts = tasks.iter().fold(Self::default(), |mut counts, task| {
            counts.all += 1;
            if task.completed {
                counts.completed += 1;
            } else {
                counts.pending += 1;
            }
            match task.priority {
                TaskPriority::High => counts.high += 1,
                TaskPriority::Medium => counts.medium += 1,
                TaskPriority::Low => counts.low += 1,
            }
            counts
        });
        counts.recent = tasks.len().min(RECENT_WINDOW);
        counts
    }

    pub fn get(&self, filter: TaskFilter) -> usize {
        match filter {
            TaskFilter::All => self.all,
            TaskFilter::Completed => self.completed,
            TaskFilter::Pending => self.pending,
            TaskFilter::High => self.high,
            TaskFilter::Medium => self.medium,
            TaskFilter::Low => self.low,
            TaskFilter::Recent => self.recent,
        }
    }
}
