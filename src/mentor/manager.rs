//! MentorManager — coordinates session state, LLM extraction and response,
//! and phase transitions for every incoming message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::config::MentorConfig;
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::store::SessionStore;

use super::extraction::{Extractor, ProfileUpdate};
use super::knowledge::{category_of, find_mentioned_hobbies};
use super::prompts::{FALLBACK_REPLY, profile_summary};
use super::response::Responder;
use super::session::SessionStatus;
use super::state::{Phase, route};

type LockTable = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Text to show the user.
    pub reply: String,
    /// Phase after the turn.
    pub phase: Phase,
    /// Hobbies first surfaced by this reply.
    pub new_hobbies: Vec<String>,
    /// Reply generation failed and the fixed fallback was sent instead.
    pub used_fallback: bool,
}

/// A claim on one session's lock. Dropping it forgets the table entry once
/// no other caller holds or awaits the same lock, also when the owning
/// future is cancelled or unwinds.
struct LockLease<'a> {
    table: &'a LockTable,
    session_id: String,
    lock: Arc<Mutex<()>>,
}

impl LockLease<'_> {
    async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table, one held by this lease.
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.session_id);
        }
    }
}

/// Drives the guided conversation for every session.
///
/// Each turn works on a copy of the stored session and writes it back at the
/// end. Turns for the same session id are serialized through a per-id lock;
/// different ids run in parallel.
pub struct MentorManager {
    store: Arc<dyn SessionStore>,
    extractor: Extractor,
    responder: Responder,
    suggestion_cap: u32,
    locks: LockTable,
}

impl MentorManager {
    pub fn new(store: Arc<dyn SessionStore>, llm: Arc<dyn LlmProvider>, config: &MentorConfig) -> Self {
        Self {
            store,
            extractor: Extractor::new(Arc::clone(&llm), config.llm_timeout),
            responder: Responder::new(llm, config.responder_config()),
            suggestion_cap: config.suggestion_cap,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Handle an incoming message and return the assistant's reply.
    ///
    /// Never fails: any error is logged and answered with the fallback text,
    /// leaving the stored session as it was.
    pub async fn handle_message(&self, session_id: &str, text: &str) -> String {
        match self.try_handle_message(session_id, text).await {
            Ok(outcome) => outcome.reply,
            Err(e) => {
                error!(session_id, error = %e, "Turn failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Handle an incoming message, surfacing orchestration errors.
    pub async fn try_handle_message(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let lease = self.lease(session_id);
        let span = tracing::info_span!("turn", session_id, turn_id = %Uuid::new_v4());
        async {
            let _guard = lease.acquire().await;
            self.run_turn(session_id, text).await
        }
        .instrument(span)
        .await
    }

    async fn run_turn(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let mut session = self.store.get_or_create(session_id).await?;
        let phase = session.phase;
        let message = text.trim();

        if !message.is_empty() {
            session.push_user(message);
        }

        let update = match self.extractor.extract(phase, message).await {
            Ok(update) => update,
            Err(e) => {
                warn!(%phase, error = %e, "Extraction failed, keeping known profile");
                ProfileUpdate::None
            }
        };
        if !update.is_empty() {
            debug!(%phase, ?update, "Merging profile update");
        }
        session.apply_update(&update);

        let (reply, used_fallback) = match self.responder.respond(phase, &session, message).await {
            Ok(reply) => (reply, false),
            Err(e) => {
                warn!(%phase, error = %e, "Response generation failed, answering with fallback");
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        if phase == Phase::Suggesting {
            session.suggestion_count += 1;
        }
        let next = route(phase, session.suggestion_count, self.suggestion_cap);
        session.advance_to(next)?;

        let new_hobbies: Vec<String> = if phase == Phase::Suggesting {
            let found = find_mentioned_hobbies(&reply, &session.suggested_hobbies);
            session.record_suggestions(&found);
            found.into_iter().map(String::from).collect()
        } else {
            Vec::new()
        };

        session.push_assistant(reply.clone());
        self.store.update(&session).await?;

        if next != phase {
            info!(from = %phase, to = %next, "Phase advanced");
        }
        for hobby in &new_hobbies {
            let category = category_of(hobby).unwrap_or("other");
            info!(hobby = hobby.as_str(), category, "Hobby suggested");
        }
        debug!(
            profile = %profile_summary(&session.interests, &session.dislikes, &session.lifestyle),
            suggestions = session.suggestion_count,
            "Turn complete"
        );

        Ok(TurnOutcome {
            reply,
            phase: next,
            new_hobbies,
            used_fallback,
        })
    }

    /// Delete a session. The next reference starts from scratch.
    pub async fn reset(&self, session_id: &str) -> Result<bool> {
        let lease = self.lease(session_id);
        let existed = {
            let _guard = lease.acquire().await;
            self.store.delete(session_id).await?
        };
        info!(session_id, existed, "Session reset");
        Ok(existed)
    }

    /// Current status, creating the session if it does not exist yet.
    pub async fn status(&self, session_id: &str) -> Result<SessionStatus> {
        let lease = self.lease(session_id);
        let _guard = lease.acquire().await;
        let session = self.store.get_or_create(session_id).await?;
        Ok(session.status())
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub async fn prune_idle(&self, max_idle: Duration) -> Result<usize> {
        let removed = self.store.prune_idle(max_idle).await?;
        if !removed.is_empty() {
            info!(count = removed.len(), "Pruned idle sessions");
        }
        Ok(removed.len())
    }

    fn lease(&self, session_id: &str) -> LockLease<'_> {
        let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(table.entry(session_id.to_string()).or_default());
        LockLease {
            table: &self.locks,
            session_id: session_id.to_string(),
            lock,
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_expiry_task(
    manager: Arc<MentorManager>,
    max_idle: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = manager.prune_idle(max_idle).await {
                warn!(error = %e, "Idle session sweep failed");
            }
        }
    })
}
