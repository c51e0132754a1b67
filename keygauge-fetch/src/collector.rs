//! Collection orchestrator.
//!
//! Runs one task per enabled provider concurrently, flattens single and
//! multi-credential results into one list, and drops any provider whose
//! task fails as a whole. One provider's outage never hides another's data.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use keygauge_core::{Credential, Metric, ProviderKind, Sample};
use tracing::{debug, error, info, instrument, warn};

use crate::adapter::UsageAdapter;
use crate::context::{Credentials, FetchContext};
use crate::error::{ErrorClass, FetchError};
use crate::processor::KeyProcessor;

// ============================================================================
// Provider Task
// ============================================================================

/// What a provider task yields.
#[derive(Debug, Clone, PartialEq)]
pub enum Collected {
    /// A single-credential provider's metric.
    One(Metric),
    /// One metric per credential.
    Many(Vec<Metric>),
}

impl Collected {
    /// Flattens into a list.
    pub fn into_vec(self) -> Vec<Metric> {
        match self {
            Self::One(metric) => vec![metric],
            Self::Many(metrics) => metrics,
        }
    }
}

/// One provider's unit of work in a collection cycle.
#[async_trait]
pub trait ProviderTask: Send + Sync {
    /// The provider this task collects.
    fn provider(&self) -> ProviderKind;

    /// Runs the provider's collection.
    async fn run(&self, ctx: &Arc<FetchContext>) -> Result<Collected, FetchError>;
}

/// Collects a provider configured with one credential.
///
/// The credential goes through the key processor, so a failed call yields a
/// failure metric labelled with the masked key.
pub struct SingleKeyTask {
    processor: KeyProcessor,
    credential: Credential,
}

impl SingleKeyTask {
    /// Creates the task.
    pub fn new(adapter: Arc<dyn UsageAdapter>, credential: Credential) -> Self {
        Self {
            processor: KeyProcessor::new(adapter),
            credential,
        }
    }
}

#[async_trait]
impl ProviderTask for SingleKeyTask {
    fn provider(&self) -> ProviderKind {
        self.processor.provider()
    }

    async fn run(&self, ctx: &Arc<FetchContext>) -> Result<Collected, FetchError> {
        let metrics = self
            .processor
            .process(ctx, std::slice::from_ref(&self.credential))
            .await?;
        match <[Metric; 1]>::try_from(metrics) {
            Ok([metric]) => Ok(Collected::One(metric)),
            Err(metrics) => Ok(Collected::Many(metrics)),
        }
    }
}

/// Runs a provider's credential list through the key processor.
pub struct MultiKeyTask {
    processor: KeyProcessor,
    credentials: Vec<Credential>,
}

impl MultiKeyTask {
    /// Creates the task.
    pub fn new(adapter: Arc<dyn UsageAdapter>, credentials: Vec<Credential>) -> Self {
        Self {
            processor: KeyProcessor::new(adapter),
            credentials,
        }
    }
}

#[async_trait]
impl ProviderTask for MultiKeyTask {
    fn provider(&self) -> ProviderKind {
        self.processor.provider()
    }

    async fn run(&self, ctx: &Arc<FetchContext>) -> Result<Collected, FetchError> {
        let metrics = self.processor.process(ctx, &self.credentials).await?;
        Ok(Collected::Many(metrics))
    }
}

/// Picks the task shape matching the configured credentials.
pub fn task_for(adapter: Arc<dyn UsageAdapter>, credentials: Credentials) -> Arc<dyn ProviderTask> {
    match credentials {
        Credentials::One(credential) => Arc::new(SingleKeyTask::new(adapter, credential)),
        Credentials::Many(list) => Arc::new(MultiKeyTask::new(adapter, list)),
    }
}

// ============================================================================
// Collection Report
// ============================================================================

/// A provider dropped from the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// The provider.
    pub provider: ProviderKind,
    /// Failure class, or `None` if the task aborted.
    pub class: Option<ErrorClass>,
    /// Human-readable reason.
    pub error: String,
}

/// The result of one collection cycle.
#[derive(Debug)]
pub struct CollectionReport {
    /// Every metric, sorted by provider then credential id.
    pub metrics: Vec<Metric>,
    /// Providers excluded from the result.
    pub failed_providers: Vec<ProviderFailure>,
    /// Wall time of the cycle.
    pub duration: Duration,
}

impl CollectionReport {
    /// Returns each metric with its category and derived quantities.
    pub fn samples(&self) -> Vec<Sample<'_>> {
        self.metrics.iter().map(Sample::of).collect()
    }

    /// Returns the number of metrics marked successful.
    pub fn success_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.is_success()).count()
    }

    /// Returns the number of failure-shaped metrics.
    pub fn failure_count(&self) -> usize {
        self.metrics.len() - self.success_count()
    }
}

// ============================================================================
// Collector
// ============================================================================

/// Runs every provider task of a cycle concurrently.
#[derive(Default)]
pub struct Collector {
    tasks: Vec<Arc<dyn ProviderTask>>,
}

impl Collector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector with the given tasks.
    pub fn with_tasks(tasks: Vec<Arc<dyn ProviderTask>>) -> Self {
        Self { tasks }
    }

    /// Adds a task.
    pub fn add_task(&mut self, task: Arc<dyn ProviderTask>) {
        self.tasks.push(task);
    }

    /// Returns the number of provider tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no provider is enabled.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs all provider tasks and waits for every one to settle.
    #[instrument(skip_all, fields(providers = self.tasks.len()))]
    pub async fn collect(&self, ctx: &Arc<FetchContext>) -> CollectionReport {
        let start = Instant::now();
        info!(count = self.tasks.len(), "Starting collection cycle");

        let runs = self.tasks.iter().map(|task| {
            let provider = task.provider();
            let task = Arc::clone(task);
            let ctx = Arc::clone(ctx);
            let handle = tokio::spawn(async move { task.run(&ctx).await });
            async move { (provider, handle.await) }
        });

        let mut metrics = Vec::new();
        let mut failed_providers = Vec::new();

        for (provider, joined) in join_all(runs).await {
            match joined {
                Ok(Ok(collected)) => {
                    let batch = collected.into_vec();
                    debug!(provider = %provider, metrics = batch.len(), "Provider collected");
                    metrics.extend(batch);
                }
                Ok(Err(err)) => {
                    let class = err.class();
                    if class == ErrorClass::Configuration {
                        error!(provider = %provider, error = %err, "Provider misconfigured, skipped");
                    } else {
                        warn!(provider = %provider, class = %class, error = %err, "Provider failed, skipped");
                    }
                    failed_providers.push(ProviderFailure {
                        provider,
                        class: Some(class),
                        error: err.to_string(),
                    });
                }
                Err(join_error) => {
                    error!(provider = %provider, error = %join_error, "Provider task aborted, skipped");
                    failed_providers.push(ProviderFailure {
                        provider,
                        class: None,
                        error: format!("task aborted: {join_error}"),
                    });
                }
            }
        }

        metrics.sort_by(|a, b| {
            a.provider
                .cmp(&b.provider)
                .then_with(|| a.credential_id.cmp(&b.credential_id))
        });

        let report = CollectionReport {
            metrics,
            failed_providers,
            duration: start.elapsed(),
        };
        info!(
            metrics = report.metrics.len(),
            succeeded = report.success_count(),
            failed = report.failure_count(),
            failed_providers = report.failed_providers.len(),
            duration = ?report.duration,
            "Collection cycle finished"
        );
        report
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<_> = self.tasks.iter().map(|t| t.provider()).collect();
        f.debug_struct("Collector")
            .field("providers", &providers)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
