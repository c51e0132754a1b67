//! Concurrent key processor.
//!
//! Fans one adapter out across every credential of a provider, waits for all
//! calls to settle, and yields exactly one outcome per credential. A failing
//! credential never aborts its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use keygauge_core::{Credential, Failure, Metric, ProviderKind};
use tracing::{debug, info, instrument, warn};

use crate::adapter::UsageAdapter;
use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Key Outcome
// ============================================================================

/// The outcome of one credential's adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The adapter produced a metric.
    Success(Metric),
    /// The adapter call failed after its retry policy was exhausted.
    Failure(Failure),
}

impl KeyOutcome {
    /// Returns true for a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the masked credential id this outcome belongs to.
    pub fn credential_id(&self) -> Option<&str> {
        match self {
            Self::Success(metric) => metric.credential_id.as_deref(),
            Self::Failure(failure) => Some(&failure.credential_id),
        }
    }

    /// Converts to a metric; failures become zeroed failure metrics.
    pub fn into_metric(self, provider: ProviderKind) -> Metric {
        match self {
            Self::Success(metric) => metric,
            Self::Failure(failure) => Metric::from_failure(provider, &failure),
        }
    }
}

// ============================================================================
// Process Report
// ============================================================================

/// All outcomes of one processor run.
#[derive(Debug)]
pub struct ProcessReport {
    /// One outcome per credential, in credential order.
    pub outcomes: Vec<KeyOutcome>,
    /// Wall time of the whole fan-out.
    pub duration: Duration,
}

impl ProcessReport {
    /// Returns the number of successful credentials.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Returns the number of failed credentials.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Converts every outcome into a metric.
    pub fn into_metrics(self, provider: ProviderKind) -> Vec<Metric> {
        self.outcomes
            .into_iter()
            .map(|outcome| outcome.into_metric(provider))
            .collect()
    }
}

// ============================================================================
// Key Processor
// ============================================================================

/// Runs one adapter across many credentials concurrently.
#[derive(Clone)]
pub struct KeyProcessor {
    adapter: Arc<dyn UsageAdapter>,
}

impl KeyProcessor {
    /// Creates a processor for `adapter`.
    pub fn new(adapter: Arc<dyn UsageAdapter>) -> Self {
        Self { adapter }
    }

    /// The provider this processor collects.
    pub fn provider(&self) -> ProviderKind {
        self.adapter.provider()
    }

    /// Fetches every credential and returns one metric per credential.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] before any call is made when
    /// `credentials` is empty.
    pub async fn process(
        &self,
        ctx: &Arc<FetchContext>,
        credentials: &[Credential],
    ) -> Result<Vec<Metric>, FetchError> {
        let report = self.run(ctx, credentials).await?;
        Ok(report.into_metrics(self.provider()))
    }

    /// Fetches every credential and returns the typed outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] before any call is made when
    /// `credentials` is empty.
    #[instrument(skip_all, fields(provider = %self.provider(), keys = credentials.len()))]
    pub async fn run(
        &self,
        ctx: &Arc<FetchContext>,
        credentials: &[Credential],
    ) -> Result<ProcessReport, FetchError> {
        let provider = self.provider();
        if credentials.is_empty() {
            return Err(FetchError::Config(format!(
                "{provider} is enabled but has no credentials"
            )));
        }

        let start = Instant::now();
        debug!("Fanning out over credentials");

        let calls = credentials.iter().map(|credential| {
            let adapter = Arc::clone(&self.adapter);
            let ctx = Arc::clone(ctx);
            let credential = credential.clone();
            let key = credential.masked_id();
            let handle =
                tokio::spawn(async move { adapter.fetch(&ctx, &credential).await });
            async move { (key, handle.await) }
        });

        let outcomes: Vec<KeyOutcome> = join_all(calls)
            .await
            .into_iter()
            .map(|(key, joined)| match joined {
                Ok(Ok(metric)) => {
                    info!(key = %key, usage = metric.usage, limit = metric.limit, "Key succeeded");
                    KeyOutcome::Success(
                        metric
                            .with_credential_id(key.clone())
                            .with_detail("api_key_id", key)
                            .mark_success(),
                    )
                }
                Ok(Err(error)) => {
                    warn!(key = %key, class = %error.class(), error = %error, "Key failed");
                    KeyOutcome::Failure(Failure::new(key, error.to_string()))
                }
                Err(join_error) => {
                    warn!(key = %key, error = %join_error, "Key task aborted");
                    KeyOutcome::Failure(Failure::new(key, format!("task aborted: {join_error}")))
                }
            })
            .collect();

        let report = ProcessReport {
            outcomes,
            duration: start.elapsed(),
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            duration = ?report.duration,
            "Processed credentials"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for KeyProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyProcessor")
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchSettings;
    use async_trait::async_trait;
    use keygauge_core::LimitStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds unless the key starts with `bad` or `panic`.
    struct MockAdapter {
        calls: AtomicUsize,
    }

    impl MockAdapter {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UsageAdapter for MockAdapter {
        fn provider(&self) -> ProviderKind {
            ProviderKind::CoinGecko
        }

        fn limit_strategy(&self) -> LimitStrategy {
            LimitStrategy::Direct
        }

        async fn fetch(
            &self,
            _ctx: &FetchContext,
            credential: &Credential,
        ) -> Result<Metric, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = credential.expose();
            if key.starts_with("panic") {
                panic!("adapter bug");
            }
            if key.starts_with("bad") {
                return Err(FetchError::AuthenticationFailed("invalid key".into()));
            }
            Ok(Metric::new(ProviderKind::CoinGecko, 100, 1000))
        }
    }

    fn ctx() -> Arc<FetchContext> {
        Arc::new(FetchContext::new(FetchSettings::default()).unwrap())
    }

    fn keys(raw: &[&str]) -> Vec<Credential> {
        raw.iter().map(|k| Credential::new(*k)).collect()
    }

    #[tokio::test]
    async fn test_one_metric_per_credential() {
        let processor = KeyProcessor::new(Arc::new(MockAdapter::new()));
        let credentials = keys(&["good-key-0000001", "bad-key-00000002", "good-key-0000003"]);

        let metrics = processor.process(&ctx(), &credentials).await.unwrap();

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics.iter().filter(|m| m.is_success()).count(), 2);
        let failed = metrics.iter().find(|m| !m.is_success()).unwrap();
        assert_eq!((failed.usage, failed.limit), (0, 0));
        assert_eq!(failed.credential_id.as_deref(), Some("bad-key-00...0002"));
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_siblings() {
        let processor = KeyProcessor::new(Arc::new(MockAdapter::new()));

        let alone = processor
            .process(&ctx(), &keys(&["good-key-0000001"]))
            .await
            .unwrap();
        let with_bad = processor
            .process(&ctx(), &keys(&["good-key-0000001", "bad-key-00000002"]))
            .await
            .unwrap();

        assert_eq!(alone[0], with_bad[0]);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let processor = KeyProcessor::new(Arc::new(MockAdapter::new()));
        let report = processor
            .run(&ctx(), &keys(&["panic-key-000001", "good-key-0000002"]))
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert!(matches!(report.outcomes[0], KeyOutcome::Failure(_)));
    }

    #[tokio::test]
    async fn test_empty_credentials_fail_fast() {
        let adapter = Arc::new(MockAdapter::new());
        let processor = KeyProcessor::new(adapter.clone());

        let err = processor.process(&ctx(), &[]).await.unwrap_err();

        assert!(matches!(err, FetchError::Config(_)));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_metric_is_marked() {
        let processor = KeyProcessor::new(Arc::new(MockAdapter::new()));
        let report = processor
            .run(&ctx(), &keys(&["good-key-0000001"]))
            .await
            .unwrap();

        let KeyOutcome::Success(metric) = &report.outcomes[0] else {
            panic!("expected success");
        };
        assert!(metric.is_success());
        assert_eq!(metric.detail.get("success"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(report.outcomes[0].credential_id(), Some("good-key-0...0001"));
    }
}
