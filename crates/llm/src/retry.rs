use std::time::Duration;

use tracing::warn;

use crate::config::GeminiConfig;
use crate::{GenerationError, TextGenerator};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            timeout: config.timeout,
            ..Self::default()
        }
    }

    /// Delay after the given (1-based) failed attempt: doubles each time, capped.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Adds a per-attempt deadline and bounded retries to any generator.
#[derive(Debug, Clone)]
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0_u32;

        loop {
            attempt += 1;
            let outcome =
                match tokio::time::timeout(self.policy.timeout, self.inner.generate(prompt)).await {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::Timeout {
                        after: self.policy.timeout,
                    }),
                };

            let error = match outcome {
                Ok(text) => return Ok(text),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= max_attempts {
                if attempt == 1 {
                    return Err(error);
                }
                return Err(GenerationError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.policy.backoff_for(attempt);
            warn!(
                generator = self.inner.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "generation attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Clone)]
    struct Flaky {
        failures_left: Arc<AtomicU32>,
        calls: Arc<AtomicU32>,
        status: u16,
        delay: Duration,
    }

    impl Flaky {
        fn new(failures: u32, status: u16) -> Self {
            Self {
                failures_left: Arc::new(AtomicU32::new(failures)),
                calls: Arc::new(AtomicU32::new(0)),
                status,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(GenerationError::Status {
                    status: self.status,
                    body: String::new(),
                });
            }
            Ok("ok".to_string())
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            timeout: Duration::from_millis(200),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn recovers_from_transient_failures() {
        let flaky = Flaky::new(2, 503);
        let generator = RetryingGenerator::new(flaky.clone(), fast_policy(3));
        assert_eq!(generator.generate("p").await.unwrap(), "ok");
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let flaky = Flaky::new(5, 500);
        let generator = RetryingGenerator::new(flaky.clone(), fast_policy(2));
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { attempts: 2, .. }));
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let flaky = Flaky::new(1, 400);
        let generator = RetryingGenerator::new(flaky.clone(), fast_policy(3));
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 400, .. }));
        assert_eq!(flaky.calls(), 1);
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        let mut flaky = Flaky::new(0, 200);
        flaky.delay = Duration::from_millis(500);
        let policy = RetryPolicy {
            timeout: Duration::from_millis(10),
            ..fast_policy(1)
        };
        let generator = RetryingGenerator::new(flaky, policy);
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { .. }));
    }
}
