//! File-based session storage implementation
//!
//! Stores the session as JSON in a single file on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::model::Session;
use super::store::SessionStore;
use crate::Result;

/// File-based session store using JSON
pub struct FileSessionStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory copy of the persisted session
    cache: RwLock<Option<Session>>,
}

impl FileSessionStore {
    /// Create a new FileSessionStore
    ///
    /// A missing file means no session. A file that no longer parses is
    /// treated the same way and removed on the next write or clear.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<Session>(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("Ignoring unreadable session file {:?}: {}", path, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the cache to disk
    async fn persist(&self, session: &Session) -> Result<()> {
        let content = serde_json::to_string_pretty(session)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self.cache.read().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut cache = self.cache.write().await;
        self.persist(session).await?;
        *cache = Some(session.clone());
        debug!("Session saved for user {}", session.user.username);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *cache = None;
        debug!("Session cleared");
        Ok(())
    }
}
