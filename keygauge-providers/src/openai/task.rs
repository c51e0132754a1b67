//! Provider-scope OpenAI collection with cost allocation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use keygauge_core::{CoreError, Credential, LimitStrategy, Metric, ProviderKind, allocate_cost};
use keygauge_fetch::{
    Collected, FetchContext, FetchError, KeyOutcome, KeyProcessor, ProviderTask, RetryPolicy,
    RetryingAdapter,
};
use tracing::{info, instrument, warn};

use super::adapter::OpenAiKeyAdapter;
use super::api::{OpenAiApi, UsageWindow};

/// Collects every configured OpenAI key and allocates the organization's
/// cost across them.
///
/// Keys that fail keep their failure metric. If no successful key used any
/// tokens the whole provider fails, since there is nothing to allocate by.
#[derive(Debug)]
pub struct OpenAiTask {
    api: Arc<OpenAiApi>,
    credentials: Vec<Credential>,
    retry: RetryPolicy,
}

impl OpenAiTask {
    /// Creates a task.
    pub fn new(api: Arc<OpenAiApi>, credentials: Vec<Credential>, retry: RetryPolicy) -> Self {
        Self {
            api,
            credentials,
            retry,
        }
    }
}

#[async_trait]
impl ProviderTask for OpenAiTask {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    #[instrument(skip_all, fields(provider = "openai", keys = self.credentials.len()))]
    async fn run(&self, ctx: &Arc<FetchContext>) -> Result<Collected, FetchError> {
        if self.credentials.is_empty() {
            return Err(FetchError::Config(
                "openai is enabled but has no credentials".to_string(),
            ));
        }

        let window = UsageWindow::last_day(Utc::now());
        let api: &OpenAiApi = &self.api;
        let fetch_ctx: &FetchContext = ctx;

        let index = self.retry.run(move || api.key_index(fetch_ctx)).await?;
        let unmonitored = index.unmonitored(&self.credentials);
        if unmonitored > 0 {
            warn!(unmonitored, "Organization has keys that are not configured");
        }

        let adapter = OpenAiKeyAdapter::new(Arc::clone(&self.api), Arc::new(index), window);
        let processor = KeyProcessor::new(Arc::new(RetryingAdapter::new(
            Arc::new(adapter),
            self.retry.clone(),
        )));
        let report = processor.run(ctx, &self.credentials).await?;

        let total_usage: u64 = report
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                KeyOutcome::Success(metric) => Some(metric.usage),
                KeyOutcome::Failure(_) => None,
            })
            .sum();
        if total_usage == 0 {
            return Err(CoreError::Derivation(
                "no successful key reported token usage, cannot allocate cost".to_string(),
            )
            .into());
        }

        let cost = self.retry.run(move || api.total_cost(fetch_ctx, window)).await?;
        let metrics = allocate_outcomes(report.outcomes, cost)?;
        info!(total_cost_usd = cost, total_usage, "Cost allocated");
        Ok(Collected::Many(metrics))
    }
}

/// Turns per-key token outcomes into cost-allocated metrics.
///
/// Successful keys get `floor(cost * tokens / total tokens)` as usage;
/// failures become failure metrics in place.
///
/// # Errors
///
/// Returns a derivation error if the successful keys used no tokens or the
/// cost is not a non-negative number.
pub fn allocate_outcomes(outcomes: Vec<KeyOutcome>, cost: f64) -> Result<Vec<Metric>, FetchError> {
    let usages: Vec<u64> = outcomes
        .iter()
        .map(|outcome| match outcome {
            KeyOutcome::Success(metric) => metric.usage,
            KeyOutcome::Failure(_) => 0,
        })
        .collect();
    let total_usage: u64 = usages.iter().sum();
    let allocated = allocate_cost(cost, &usages)?;

    Ok(outcomes
        .into_iter()
        .zip(allocated)
        .map(|(outcome, share)| match outcome {
            KeyOutcome::Success(metric) => {
                let tokens = metric.usage;
                Metric {
                    usage: share,
                    limit: 0,
                    ..metric
                }
                .with_limit_strategy(LimitStrategy::CostProportional)
                .with_detail("usage", tokens)
                .with_detail("total_usage", total_usage)
                .with_detail("total_cost_usd", cost)
            }
            failure @ KeyOutcome::Failure(_) => failure.into_metric(ProviderKind::OpenAi),
        })
        .collect())
}
