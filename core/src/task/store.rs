//! Task store trait
//!
//! Defines the interface to the server of record for tasks.

use async_trait::async_trait;

use super::model::{NewTask, Task, UpdatableTask};
use crate::Result;

/// Remote task collection operations
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks for the current session (`GET /api/tasks`)
    async fn list(&self) -> Result<Vec<Task>>;

    /// Every task for the current session, completed and pending (`GET /api/tasks/all`)
    async fn list_all(&self) -> Result<Vec<Task>>;

    /// Completed tasks only (`GET /api/tasks/completed`)
    async fn list_completed(&self) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get(&self, id: i64) -> Result<Option<Task>>;

    /// Create a new task
    async fn create(&self, task: &NewTask) -> Result<Task>;

    /// Replace the mutable fields of a task
    async fn update(&self, id: i64, task: &UpdatableTask) -> Result<Task>;

    /// Mark a task complete; the server stamps `completedAt`
    async fn complete(&self, id: i64) -> Result<()>;

    /// Delete a task by ID
    async fn delete(&self, id: i64) -> Result<()>;
}
