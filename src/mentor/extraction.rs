//! Extraction step: turns the user's latest message into a typed profile update.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ExtractionError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, complete_json};

use super::prompts::{EXTRACTION_SYSTEM, extraction_prompt};
use super::session::Lifestyle;
use super::state::Phase;

/// A validated, phase-specific profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileUpdate {
    Interests(Vec<String>),
    Dislikes(Vec<String>),
    Lifestyle(Lifestyle),
    None,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Interests(items) | Self::Dislikes(items) => items.is_empty(),
            Self::Lifestyle(lifestyle) => lifestyle.is_empty(),
            Self::None => true,
        }
    }
}

#[derive(Deserialize)]
struct InterestsShape {
    interests: Vec<Value>,
}

#[derive(Deserialize)]
struct DislikesShape {
    dislikes: Vec<Value>,
}

#[derive(Deserialize)]
struct LifestyleShape {
    lifestyle: serde_json::Map<String, Value>,
}

fn shape_error(phase: Phase, e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::InvalidShape {
        phase: phase.to_string(),
        reason: e.to_string(),
    }
}

/// Keep only non-blank string entries.
fn string_items(values: Vec<Value>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

fn lifestyle_value(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Validate raw model JSON against the shape expected for `phase`.
pub fn parse_update(phase: Phase, value: Value) -> Result<ProfileUpdate, ExtractionError> {
    match phase {
        Phase::Interests => {
            let shape: InterestsShape =
                serde_json::from_value(value).map_err(|e| shape_error(phase, e))?;
            Ok(ProfileUpdate::Interests(string_items(shape.interests)))
        }
        Phase::Dislikes => {
            let shape: DislikesShape =
                serde_json::from_value(value).map_err(|e| shape_error(phase, e))?;
            Ok(ProfileUpdate::Dislikes(string_items(shape.dislikes)))
        }
        Phase::Lifestyle => {
            let shape: LifestyleShape =
                serde_json::from_value(value).map_err(|e| shape_error(phase, e))?;
            Ok(ProfileUpdate::Lifestyle(Lifestyle {
                energy: lifestyle_value(&shape.lifestyle, "energy"),
                time: lifestyle_value(&shape.lifestyle, "time"),
                social: lifestyle_value(&shape.lifestyle, "social"),
            }))
        }
        Phase::Start | Phase::Suggesting | Phase::Terminated => Ok(ProfileUpdate::None),
    }
}

/// Asks the model for structured profile data.
pub struct Extractor {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl Extractor {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Extract a profile update from `user_message` for `phase`.
    ///
    /// Phases that collect nothing, and blank messages, yield
    /// `ProfileUpdate::None` without a model call.
    pub async fn extract(
        &self,
        phase: Phase,
        user_message: &str,
    ) -> Result<ProfileUpdate, ExtractionError> {
        if !phase.collects_profile() || user_message.trim().is_empty() {
            return Ok(ProfileUpdate::None);
        }
        let Some(prompt) = extraction_prompt(phase, user_message) else {
            return Ok(ProfileUpdate::None);
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(EXTRACTION_SYSTEM),
            ChatMessage::user(prompt),
        ])
        .with_max_tokens(512)
        .with_temperature(0.0);

        let value = tokio::time::timeout(self.timeout, complete_json(self.llm.as_ref(), request))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))?
            .map_err(|e| match e {
                LlmError::Json(err) => ExtractionError::Parse(err.to_string()),
                LlmError::InvalidResponse { reason, .. } => ExtractionError::Parse(reason),
                other => ExtractionError::Llm(other),
            })?;

        parse_update(phase, value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::llm::CompletionResponse;

    struct Scripted {
        reply: Result<&'static str, ()>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.reply {
                Ok(content) => Ok(CompletionResponse {
                    content: content.to_string(),
                    input_tokens: 0,
                    output_tokens: 0,
                }),
                Err(()) => Err(LlmError::RequestFailed {
                    provider: "scripted".into(),
                    reason: "boom".into(),
                }),
            }
        }
    }

    fn extractor(llm: Arc<Scripted>) -> Extractor {
        Extractor::new(llm, Duration::from_secs(5))
    }

    #[test]
    fn parse_interests_drops_non_strings() {
        let update = parse_update(
            Phase::Interests,
            json!({"interests": ["music", 3, " hiking ", "", null]}),
        )
        .unwrap();
        assert_eq!(
            update,
            ProfileUpdate::Interests(vec!["music".into(), "hiking".into()])
        );
    }

    #[test]
    fn parse_lifestyle_ignores_unknown_and_null_keys() {
        let update = parse_update(
            Phase::Lifestyle,
            json!({"lifestyle": {"energy": "high", "time": null, "budget": "low"}}),
        )
        .unwrap();
        assert_eq!(
            update,
            ProfileUpdate::Lifestyle(Lifestyle {
                energy: Some("high".into()),
                time: None,
                social: None,
            })
        );
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        let err = parse_update(Phase::Dislikes, json!({"interests": ["x"]})).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidShape { .. }));
        let err = parse_update(Phase::Interests, json!({"interests": "music"})).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidShape { .. }));
    }

    #[test]
    fn parse_is_none_outside_collection_phases() {
        assert_eq!(
            parse_update(Phase::Suggesting, json!({"intent": "wants_more"})).unwrap(),
            ProfileUpdate::None
        );
    }

    #[tokio::test]
    async fn extracts_interests() {
        let llm = Scripted::ok(r#"{"interests": ["music", "hiking"]}"#);
        let update = extractor(llm)
            .extract(Phase::Interests, "I like music and hiking")
            .await
            .unwrap();
        assert_eq!(
            update,
            ProfileUpdate::Interests(vec!["music".into(), "hiking".into()])
        );
    }

    #[tokio::test]
    async fn skips_model_for_blank_message_and_other_phases() {
        let llm = Scripted::ok("{}");
        let ex = extractor(llm.clone());
        assert_eq!(ex.extract(Phase::Interests, "   ").await.unwrap(), ProfileUpdate::None);
        assert_eq!(ex.extract(Phase::Suggesting, "more!").await.unwrap(), ProfileUpdate::None);
        assert_eq!(ex.extract(Phase::Start, "hello").await.unwrap(), ProfileUpdate::None);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let err = extractor(Scripted::ok("sorry, I can't do that"))
            .extract(Phase::Interests, "I love hiking and painting")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[tokio::test]
    async fn provider_failure_is_llm_error() {
        let err = extractor(Scripted::failing())
            .extract(Phase::Dislikes, "I hate crowds")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Llm(_)));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let llm = Arc::new(Scripted {
            reply: Ok(r#"{"interests": []}"#),
            delay: Duration::from_millis(200),
            calls: AtomicUsize::new(0),
        });
        let ex = Extractor::new(llm, Duration::from_millis(20));
        let err = ex.extract(Phase::Interests, "music").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(_)));
    }

    #[test]
    fn update_emptiness() {
        assert!(ProfileUpdate::None.is_empty());
        assert!(ProfileUpdate::Interests(vec![]).is_empty());
        assert!(ProfileUpdate::Lifestyle(Lifestyle::default()).is_empty());
        assert!(!ProfileUpdate::Dislikes(vec!["noise".into()]).is_empty());
    }
}
