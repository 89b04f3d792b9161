//! `SessionStore` trait — single async interface for session persistence.
//!
//! The orchestrator only talks to this trait, so the in-memory backend can be
//! swapped for a key-value store or database without touching the mentor.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::mentor::Session;

/// Backend-agnostic session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session.
    async fn get(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Look up a session, creating a fresh one if the id is unseen.
    async fn get_or_create(&self, id: &str) -> Result<Session, StoreError>;

    /// Replace the stored session with `session` (keyed by `session.id`).
    async fn update(&self, session: &Session) -> Result<(), StoreError>;

    /// Delete a session. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Delete sessions not updated within `max_idle`. Returns the ids removed.
    async fn prune_idle(&self, max_idle: Duration) -> Result<Vec<String>, StoreError>;

    /// Number of live sessions.
    async fn len(&self) -> Result<usize, StoreError>;
}
