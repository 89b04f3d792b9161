//! In-memory session store, lives for the process lifetime.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::mentor::Session;

use super::traits::SessionStore;

/// `HashMap`-backed store behind a tokio `RwLock`.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn get_or_create(&self, id: &str) -> Result<Session, StoreError> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Ok(session.clone());
        }
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = id, "Creating session");
            Session::new(id)
        });
        Ok(session.clone())
    }

    async fn update(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn prune_idle(&self, max_idle: Duration) -> Result<Vec<String>, StoreError> {
        let max_idle = chrono::Duration::from_std(max_idle)
            .map_err(|e| StoreError::Backend(format!("invalid idle duration: {e}")))?;
        let cutoff = Utc::now() - max_idle;

        let mut sessions = self.sessions.write().await;
        let stale: Vec<String> = sessions
            .values()
            .filter(|s| s.updated_at < cutoff)
            .map(|s| s.id.clone())
            .collect();
        for id in &stale {
            sessions.remove(id);
        }
        Ok(stale)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.read().await.len())
    }
}
