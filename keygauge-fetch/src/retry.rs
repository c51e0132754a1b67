//! Retry policy for adapter calls.
//!
//! Retries are local to one credential's adapter call. Only transient
//! failures are retried; the caller always sees a final outcome.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use tracing::{debug, warn};

use crate::adapter::UsageAdapter;
use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Retry Policy
// ============================================================================

/// Policy for retrying a failed adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay between attempts in seconds.
    pub base_delay_secs: u64,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
    /// Maximum delay between attempts in seconds.
    pub max_delay_secs: u64,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Creates a policy with a fixed 120 second delay.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_secs: 120,
            exponential_backoff: false,
            max_delay_secs: 3600,
            attempt_timeout: None,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_secs: 0,
            exponential_backoff: false,
            max_delay_secs: 0,
            attempt_timeout: None,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, secs: u64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Bounds each attempt.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Calculates the delay after a given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            self.base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        } else {
            self.base_delay_secs
        };

        Duration::from_secs(delay.min(self.max_delay_secs))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error once no further attempt will be made.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, op())
                    .await
                    .unwrap_or_else(|_| Err(FetchError::Timeout(limit.as_secs()))),
                None => op().await,
            };

            let error = match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if attempt >= max_attempts || !error.is_transient() {
                return Err(error);
            }

            let delay = match &error {
                FetchError::RateLimited {
                    retry_after: Some(secs),
                } => Duration::from_secs((*secs).min(self.max_delay_secs)),
                _ => self.delay_for_attempt(attempt),
            };
            warn!(
                error = %error,
                attempt,
                max_attempts,
                delay_secs = delay.as_secs(),
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

// ============================================================================
// Retrying Adapter
// ============================================================================

/// Wraps an adapter so each `fetch` runs under a retry policy.
pub struct RetryingAdapter {
    inner: Arc<dyn UsageAdapter>,
    policy: RetryPolicy,
}

impl RetryingAdapter {
    /// Wraps `inner` with `policy`.
    pub fn new(inner: Arc<dyn UsageAdapter>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl UsageAdapter for RetryingAdapter {
    fn provider(&self) -> ProviderKind {
        self.inner.provider()
    }

    fn limit_strategy(&self) -> LimitStrategy {
        self.inner.limit_strategy()
    }

    async fn fetch(
        &self,
        ctx: &FetchContext,
        credential: &Credential,
    ) -> Result<Metric, FetchError> {
        let inner = &self.inner;
        self.policy
            .run(move || inner.fetch(ctx, credential))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(120));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(120));
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(5)
            .with_base_delay(1)
            .with_exponential_backoff(true);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy::new(10)
            .with_base_delay(1000)
            .with_exponential_backoff(true);

        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_retried_with_delay() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = tokio::time::Instant::now();

        let result = RetryPolicy::new(3)
            .run(|| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::Timeout(30))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(240));
    }

    #[tokio::test]
    async fn test_permanent_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = RetryPolicy::new(5)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::AuthenticationFailed("bad key".into()))
            })
            .await;

        assert!(matches!(result, Err(FetchError::AuthenticationFailed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = RetryPolicy::new(2)
            .with_base_delay(1)
            .run(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Status {
                    status: 502,
                    body: String::new(),
                })
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 502, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let result: Result<(), _> = RetryPolicy::no_retry()
            .with_attempt_timeout(Duration::from_secs(5))
            .run(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(FetchError::Timeout(5))));
    }
}
