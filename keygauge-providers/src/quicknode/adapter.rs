//! QuickNode usage adapter.

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{FetchContext, FetchError, ProviderSettings, UsageAdapter, endpoint, header_map};
use tracing::instrument;

use super::parser::{QuickNodeUsageEnvelope, usage_metric};

/// Console API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.quicknode.com";

/// Fetches one console API key's RPC credit usage.
#[derive(Debug, Clone)]
pub struct QuickNodeAdapter {
    base_url: String,
}

impl QuickNodeAdapter {
    /// Creates an adapter honoring the configured base URL.
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        }
    }
}

#[async_trait]
impl UsageAdapter for QuickNodeAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::QuickNode
    }

    fn limit_strategy(&self) -> LimitStrategy {
        LimitStrategy::Direct
    }

    #[instrument(skip_all, fields(key = %credential))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        credential: &Credential,
    ) -> Result<Metric, FetchError> {
        let url = endpoint(&self.base_url, "v0/usage/rpc")?;
        let headers = header_map(&[
            ("accept", "application/json"),
            ("x-api-key", credential.expose()),
        ])?;

        let envelope: QuickNodeUsageEnvelope = ctx.http.get_json(url.as_str(), headers).await?;
        usage_metric(envelope)
    }
}
