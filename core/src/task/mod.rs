//! Task module
//!
//! This module contains task-related types and logic.

mod datetime;
mod filter;
mod model;
mod store;

pub use filter::{filter_tasks, recent_tasks, FilterCounts, TaskFilter, RECENT_WINDOW};
pub use model::*;
pub use store::TaskStore;
