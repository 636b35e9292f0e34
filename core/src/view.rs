//! Reorderable task list view
//!
//! Holds the filter and search selection for one list, plus a local ordering
//! of the tasks that drag-and-drop can rearrange. The ordering is display
//! state only; the next `sync` from the manager replaces it.

use crate::task::{filter_tasks, FilterCounts, Task, TaskFilter};

#[derive(Debug, Clone, Default)]
pub struct TaskListView {
    filter: TaskFilter,
    query: String,
    items: Vec<Task>,
}

impl TaskListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Replace the local ordering with the latest server read
    pub fn sync(&mut self, tasks: Vec<Task>) {
        self.items = tasks;
    }

    /// Rows to display for the current filter and search
    pub fn visible(&self) -> Vec<Task> {
        filter_tasks(&self.items, self.filter, &self.query)
    }

    /// Sidebar counts over everything in the view, ignoring filter and search
    pub fn counts(&self) -> FilterCounts {
        FilterCounts::from_tasks(&self.items)
    }

    /// Move the visible row at `from` to the position of the visible row at
    /// `to`. Returns false and changes nothing when either index is out of
    /// range or the active filter imposes its own order.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if !self.filter.preserves_order() {
            return false;
        }
        let visible = self.visible();
        let (Some(moved), Some(target)) = (visible.get(from), visible.get(to)) else {
            return false;
        };
        if from == to {
            return true;
        }
        let (moved_id, target_id) = (moved.id, target.id);

        let Some(source) = self.items.iter().position(|t| t.id == moved_id) else {
            return false;
        };
        let task = self.items.remove(source);
        let Some(mut destination) = self.items.iter().position(|t| t.id == target_id) else {
            self.items.insert(source, task);
            return false;
        };
        if from < to {
            destination += 1;
        }
        self.items.insert(destination, task);
        true
    }
}
