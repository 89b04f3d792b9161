//! Response step: produces the assistant's next conversational turn.

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, complete_text};

use super::prompts::{GREETING, PERSONA, phase_instructions, response_prompt};
use super::session::Session;
use super::state::Phase;

/// Sampling settings for response turns.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Log entries included as conversation context.
    pub history_window: usize,
    pub timeout: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 400,
            history_window: 6,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Generates assistant turns from the current session snapshot.
pub struct Responder {
    llm: Arc<dyn LlmProvider>,
    config: ResponderConfig,
}

impl Responder {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ResponderConfig) -> Self {
        Self { llm, config }
    }

    /// Produce the reply for a turn taken in `phase`.
    ///
    /// The greeting is fixed text; every other phase asks the model. The
    /// session's log is expected to already hold the user's latest message.
    pub async fn respond(
        &self,
        phase: Phase,
        session: &Session,
        user_message: &str,
    ) -> Result<String, LlmError> {
        let Some(instructions) = phase_instructions(phase, session) else {
            return Ok(GREETING.to_string());
        };

        let prompt = response_prompt(
            &instructions,
            session.recent_messages(self.config.history_window),
            user_message,
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(PERSONA),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        tokio::time::timeout(self.config.timeout, complete_text(self.llm.as_ref(), request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.config.timeout,
            })?
    }
}
