//! Per-conversation session state and its merge rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

use super::extraction::ProfileUpdate;
use super::state::Phase;

/// Who wrote a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the append-only message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: MessageRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Lifestyle preferences. Each key is overwritten by later extractions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifestyle {
    /// e.g. high / medium / low
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
    /// e.g. lots / some / little
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// e.g. social / solo / both
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<String>,
}

impl Lifestyle {
    pub fn is_empty(&self) -> bool {
        self.energy.is_none() && self.time.is_none() && self.social.is_none()
    }

    /// Last-write-wins per key; keys absent from `other` are kept.
    pub fn merge(&mut self, other: &Lifestyle) {
        if other.energy.is_some() {
            self.energy.clone_from(&other.energy);
        }
        if other.time.is_some() {
            self.time.clone_from(&other.time);
        }
        if other.social.is_some() {
            self.social.clone_from(&other.social);
        }
    }

    /// Compact `key: value` rendering for prompts.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            ("energy", &self.energy),
            ("time", &self.time),
            ("social", &self.social),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}: {v}")))
        .collect();

        if parts.is_empty() {
            "unknown".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Union `incoming` into `existing`, case-insensitively, keeping first spelling.
fn merge_unique(existing: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let lower = item.to_lowercase();
        if !existing.iter().any(|e| e.to_lowercase() == lower) {
            existing.push(item.to_string());
        }
    }
}

/// Full state of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub phase: Phase,
    pub interests: Vec<String>,
    pub dislikes: Vec<String>,
    pub lifestyle: Lifestyle,
    pub suggested_hobbies: Vec<String>,
    pub message_log: Vec<LogEntry>,
    pub suggestion_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session in the `start` phase.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            phase: Phase::default(),
            interests: Vec::new(),
            dislikes: Vec::new(),
            lifestyle: Lifestyle::default(),
            suggested_hobbies: Vec::new(),
            message_log: Vec::new(),
            suggestion_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(MessageRole::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(MessageRole::Assistant, content.into());
    }

    fn push(&mut self, role: MessageRole, content: String) {
        let at = Utc::now();
        self.message_log.push(LogEntry { role, content, at });
        self.updated_at = at;
    }

    /// The last `n` log entries, oldest first.
    pub fn recent_messages(&self, n: usize) -> &[LogEntry] {
        let start = self.message_log.len().saturating_sub(n);
        &self.message_log[start..]
    }

    /// Merge an extracted profile update into the session.
    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        match update {
            ProfileUpdate::Interests(items) => merge_unique(&mut self.interests, items),
            ProfileUpdate::Dislikes(items) => merge_unique(&mut self.dislikes, items),
            ProfileUpdate::Lifestyle(lifestyle) => self.lifestyle.merge(lifestyle),
            ProfileUpdate::None => {}
        }
    }

    /// Record hobbies surfaced to the user. Returns how many were new.
    pub fn record_suggestions<S: AsRef<str>>(&mut self, hobbies: &[S]) -> usize {
        let before = self.suggested_hobbies.len();
        for hobby in hobbies {
            let hobby = hobby.as_ref();
            if !self
                .suggested_hobbies
                .iter()
                .any(|h| h.eq_ignore_ascii_case(hobby))
            {
                self.suggested_hobbies.push(hobby.to_string());
            }
        }
        self.suggested_hobbies.len() - before
    }

    /// Move to `next`, rejecting anything the phase machine forbids.
    pub fn advance_to(&mut self, next: Phase) -> Result<(), SessionError> {
        if !self.phase.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                id: self.id.clone(),
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Snapshot for the status endpoint.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            interests: self.interests.clone(),
            dislikes: self.dislikes.clone(),
            lifestyle: self.lifestyle.clone(),
            suggested_hobbies: self.suggested_hobbies.clone(),
            message_count: self.message_log.len(),
        }
    }
}

/// Public view of a session returned by `GET /api/status/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: Phase,
    pub interests: Vec<String>,
    pub dislikes: Vec<String>,
    pub lifestyle: Lifestyle,
    pub suggested_hobbies: Vec<String>,
    pub message_count: usize,
}
