//! Opt-in retry of transient provider failures with exponential backoff.

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{CompletionRequest, CompletionResponse, LlmProvider};
use crate::config::RetrySettings;
use crate::llm::error::LlmResult;

/// Wraps a provider and retries network failures, timeouts and 5xx answers.
/// Authentication and quota errors are returned immediately.
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, settings: &RetrySettings) -> Self {
        Self {
            inner,
            initial_interval: Duration::from_millis(settings.initial_interval_ms),
            max_elapsed: Duration::from_secs(settings.max_elapsed_seconds),
        }
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        let inner = &self.inner;
        let request = &request;
        backoff::future::retry(policy, || async move {
            inner.complete(request.clone()).await.map_err(|err| {
                if err.is_transient() {
                    warn!(provider = inner.name(), error = %err, "Transient provider failure, retrying");
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyProvider {
        calls: AtomicUsize,
        failures: usize,
        error: fn() -> LlmError,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn model(&self) -> &str {
            "flaky-1"
        }

        async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err((self.error)())
            } else {
                Ok(CompletionResponse {
                    text: "[]".to_string(),
                    usage: None,
                })
            }
        }
    }

    fn settings() -> RetrySettings {
        RetrySettings {
            enabled: true,
            initial_interval_ms: 1,
            max_elapsed_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let inner = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            failures: 2,
            error: || LlmError::Network("reset".to_string()),
        });
        let provider = RetryingProvider::new(inner.clone(), &settings());

        let response = provider.complete(CompletionRequest::new("p", "f")).await.unwrap();
        assert_eq!(response.text, "[]");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let inner = Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            failures: 5,
            error: || LlmError::Authentication("bad key".to_string()),
        });
        let provider = RetryingProvider::new(inner.clone(), &settings());

        let err = provider.complete(CompletionRequest::new("p", "f")).await.unwrap_err();
        assert!(matches!(err, LlmError::Authentication(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
