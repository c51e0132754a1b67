//! Per-key OpenAI token usage.

use std::sync::Arc;

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{FetchContext, FetchError, UsageAdapter};
use tracing::{debug, instrument};

use super::api::{KeyIndex, OpenAiApi, UsageWindow};

/// Measures one project key's input tokens over the cycle's window.
///
/// The metric carries tokens as usage; the task replaces it with the
/// key's share of cost once every key has been measured.
#[derive(Debug, Clone)]
pub struct OpenAiKeyAdapter {
    api: Arc<OpenAiApi>,
    index: Arc<KeyIndex>,
    window: UsageWindow,
}

impl OpenAiKeyAdapter {
    /// Creates an adapter over a built key index.
    pub fn new(api: Arc<OpenAiApi>, index: Arc<KeyIndex>, window: UsageWindow) -> Self {
        Self { api, index, window }
    }
}

#[async_trait]
impl UsageAdapter for OpenAiKeyAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn limit_strategy(&self) -> LimitStrategy {
        LimitStrategy::CostProportional
    }

    #[instrument(skip_all, fields(key = %credential))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        credential: &Credential,
    ) -> Result<Metric, FetchError> {
        let key_id = self.index.resolve(credential).ok_or_else(|| {
            FetchError::AuthenticationFailed(
                "key does not belong to any project of the organization".to_string(),
            )
        })?;

        let usage = self.api.completions_usage(ctx, key_id, self.window).await?;
        let (tokens, requests) = usage.totals();
        debug!(key_id, tokens, requests, "Completions usage summed");

        Ok(Metric::new(ProviderKind::OpenAi, tokens, 0)
            .with_detail("openai_key_id", key_id)
            .with_detail("num_model_requests", requests))
    }
}
