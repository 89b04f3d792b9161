//! Bounded retry with exponential backoff for transient provider errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::LlmError;

use super::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Retry policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = no retry).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every subsequent retry.
    pub base_delay: Duration,
    /// Upper bound on a single delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Backoff for retry number `attempt` (1-based), with up to 25% jitter.
    fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay);
        let jitter_ms = (capped.as_millis() as u64) / 4;
        if jitter_ms == 0 {
            return capped;
        }
        capped + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Wraps a provider and retries transient failures.
pub struct RetryProvider {
    inner: Arc<dyn LlmProvider>,
    config: RetryConfig,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmProvider for RetryProvider {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let retry_after = match &e {
                        LlmError::RateLimited { retry_after, .. } => *retry_after,
                        _ => None,
                    };
                    let delay = self.config.delay_for(attempt, retry_after);
                    tracing::warn!(
                        model = self.inner.model_name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient LLM failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Fails with the given error `failures` times, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        auth: bool,
    }

    #[async_trait]
    impl LlmProvider for Flaky {
        fn model_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, _req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.auth {
                    return Err(LlmError::AuthFailed {
                        provider: "flaky".into(),
                    });
                }
                return Err(LlmError::RequestFailed {
                    provider: "flaky".into(),
                    reason: "connection reset".into(),
                });
            }
            Ok(CompletionResponse {
                content: "ok".into(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let inner = Arc::new(Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
            auth: false,
        });
        let provider = RetryProvider::new(inner.clone(), fast_config(2));
        let resp = provider.complete(CompletionRequest::new(vec![])).await.unwrap();
        assert_eq!(resp.content, "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(Flaky {
            failures: 5,
            calls: AtomicU32::new(0),
            auth: false,
        });
        let provider = RetryProvider::new(inner.clone(), fast_config(1));
        assert!(provider.complete(CompletionRequest::new(vec![])).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_auth_failures() {
        let inner = Arc::new(Flaky {
            failures: 1,
            calls: AtomicU32::new(0),
            auth: true,
        });
        let provider = RetryProvider::new(inner.clone(), fast_config(3));
        let err = provider
            .complete(CompletionRequest::new(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::AuthFailed { .. }));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_doubles_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        let first = config.delay_for(1, None);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        let third = config.delay_for(3, None);
        assert!(third >= Duration::from_millis(300) && third <= Duration::from_millis(375));
        assert_eq!(
            config.delay_for(1, Some(Duration::from_secs(10))),
            Duration::from_millis(300)
        );
    }
}
