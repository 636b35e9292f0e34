//! Core library for DoTask
//!
//! This crate contains the client-side business logic, including:
//! - Task model, filtering and dashboard statistics
//! - The task state manager that keeps the local list in step with the server
//! - Session persistence

pub mod error;
pub mod manager;
pub mod session;
pub mod task;
pub mod view;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use manager::{DashboardRefresher, TaskManager, ViewState};
pub use view::TaskListView;
pub type Result<T> = std::result::Result<T, Error>;
