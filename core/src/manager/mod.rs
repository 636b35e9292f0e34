//! Task state manager
//!
//! Owns the session's task list. Every mutation goes to the server first and
//! is followed by a full refetch, so what readers see is always a projection
//! of the last successful server read. No response is ever merged into the
//! list directly.

mod dashboard;
mod state;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::task::{
    filter_tasks, FilterCounts, NewTask, Task, TaskFilter, TaskStats, TaskStore, UpdatableTask,
};
use crate::{Error, Result};

pub use dashboard::DashboardRefresher;
pub use state::{TaskLists, ViewState};

pub const FETCH_FAILED: &str = "Failed to fetch tasks. Please try again.";
pub const CREATE_FAILED: &str = "Failed to create task. Please try again.";
pub const COMPLETE_FAILED: &str = "Failed to mark task as complete. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update task. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete task. Please try again.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

fn user_message(err: &Error, fallback: &str) -> String {
    if err.is_unauthorized() {
        SESSION_EXPIRED.to_string()
    } else {
        fallback.to_string()
    }
}

/// Single writer of the task list for a session
pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    state: watch::Sender<ViewState>,
    /// Fetches started but not yet resolved; only touched under the state lock
    in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl TaskManager {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            store,
            state,
            in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Receive every state change as a whole snapshot
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_string)
    }

    pub fn pending(&self) -> Vec<Task> {
        self.state.borrow().pending().to_vec()
    }

    pub fn completed(&self) -> Vec<Task> {
        self.state.borrow().completed().to_vec()
    }

    /// Every task currently shown, pending first
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().lists().all()
    }

    pub fn stats(&self) -> TaskStats {
        self.state.borrow().lists().stats()
    }

    pub fn counts(&self) -> FilterCounts {
        FilterCounts::from_tasks(&self.tasks())
    }

    /// Filtered and searched view over the current tasks
    pub fn view(&self, filter: TaskFilter, query: &str) -> Vec<Task> {
        filter_tasks(&self.tasks(), filter, query)
    }

    /// Stop applying results. Requests already in flight still complete on
    /// the server, but their outcome no longer reaches the state.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!("Task manager closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Refetch the whole collection and replace the lists in one step.
    ///
    /// On failure both lists are emptied and the error is recorded.
    pub async fn refresh(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        let fetch = Fetch::begin(self);
        let result = self.store.list_all().await;
        let ok = result.is_ok();
        fetch.finish(result);
        ok
    }

    /// Create a task, then refetch so the new task comes from the server
    pub async fn create(&self, task: &NewTask) -> bool {
        match self.store.create(task).await {
            Ok(created) => {
                info!("Created task {}", created.id);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.record_failure("create task", &e, CREATE_FAILED);
                false
            }
        }
    }

    /// Mark a task complete, then refetch.
    ///
    /// Concurrent calls for the same task are independent; whichever refetch
    /// resolves last determines what is shown.
    pub async fn complete(&self, id: i64) -> bool {
        match self.store.complete(id).await {
            Ok(()) => {
                info!("Completed task {}", id);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.record_failure("complete task", &e, COMPLETE_FAILED);
                false
            }
        }
    }

    /// Replace a task's mutable fields, then refetch
    pub async fn update(&self, id: i64, task: &UpdatableTask) -> bool {
        match self.store.update(id, task).await {
            Ok(updated) => {
                info!("Updated task {}", updated.id);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.record_failure("update task", &e, UPDATE_FAILED);
                false
            }
        }
    }

    /// Delete a task, then refetch
    pub async fn delete(&self, id: i64) -> bool {
        match self.store.delete(id).await {
            Ok(()) => {
                info!("Deleted task {}", id);
                self.refresh().await;
                true
            }
            Err(e) => {
                self.record_failure("delete task", &e, DELETE_FAILED);
                false
            }
        }
    }

    fn record_failure(&self, action: &str, err: &Error, message: &str) {
        error!("Failed to {}: {}", action, err);
        if self.is_closed() {
            return;
        }
        let message = user_message(err, message);
        self.state.send_modify(|state| state.record_error(message));
    }
}

/// One outstanding `list_all`.
///
/// Holds a slot in the in-flight count from `begin` until it is finished or
/// dropped, so a refresh cancelled mid-fetch cannot leave the state loading.
struct Fetch<'a> {
    manager: &'a TaskManager,
    done: bool,
}

impl<'a> Fetch<'a> {
    fn begin(manager: &'a TaskManager) -> Self {
        manager.state.send_modify(|state| {
            manager.in_flight.fetch_add(1, Ordering::SeqCst);
            state.begin_loading();
        });
        Self {
            manager,
            done: false,
        }
    }

    fn finish(mut self, result: Result<Vec<Task>>) {
        self.done = true;
        let manager = self.manager;
        let closed = manager.is_closed();
        manager.state.send_modify(|state| {
            let still_loading = manager.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
            if closed {
                return;
            }
            match result {
                Ok(tasks) => {
                    let lists = TaskLists::partition(tasks);
                    debug!(
                        "Fetched {} pending and {} completed tasks",
                        lists.pending.len(),
                        lists.completed.len()
                    );
                    state.apply_lists(lists, still_loading);
                }
                Err(e) => {
                    error!("Error fetching tasks: {}", e);
                    state.fail_fetch(user_message(&e, FETCH_FAILED), still_loading);
                }
            }
        });
        if closed {
            debug!("Discarding fetch result after close");
        }
    }
}

impl Drop for Fetch<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let manager = self.manager;
        let closed = manager.is_closed();
        manager.state.send_modify(|state| {
            let still_loading = manager.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
            if !closed && !still_loading {
                state.settle();
            }
        });
        debug!("Fetch cancelled before it resolved");
    }
}
