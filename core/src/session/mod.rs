//! Session module
//!
//! The authenticated identity (bearer token plus user profile) and where it
//! is persisted between runs.

mod file_store;
mod memory_store;
mod model;
mod store;

pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;
pub use model::{Session, User};
pub use store::SessionStore;
