//! Session store trait

use async_trait::async_trait;

use super::model::Session;
use crate::Result;

/// Client-local durable storage for the current session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The persisted session, if any
    async fn load(&self) -> Result<Option<Session>>;

    /// Persist a session, replacing any previous one
    async fn save(&self, session: &Session) -> Result<()>;

    /// Forget the persisted session
    async fn clear(&self) -> Result<()>;

    /// A token is present; no expiry check, no server round trip
    async fn is_authenticated(&self) -> bool {
        matches!(self.load().await, Ok(Some(session)) if !session.token.is_empty())
    }
}
