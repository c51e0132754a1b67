//! TwitterAPI usage adapter.

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{FetchContext, FetchError, ProviderSettings, UsageAdapter, endpoint, header_map};
use tracing::instrument;

use super::parser::{TwitterApiBody, info_metric};

/// API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.twitterapi.io";

/// Fetches one key's remaining package credits.
#[derive(Debug, Clone)]
pub struct TwitterApiAdapter {
    base_url: String,
}

impl TwitterApiAdapter {
    /// Creates an adapter honoring the configured base URL.
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        }
    }
}

#[async_trait]
impl UsageAdapter for TwitterApiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::TwitterApi
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
        let url = endpoint(&self.base_url, "oapi/my/info")?;
        let headers = header_map(&[
            ("accept", "application/json"),
            ("x-api-key", credential.expose()),
        ])?;

        let body: TwitterApiBody = ctx.http.get_json(url.as_str(), headers).await?;
        info_metric(body)
    }
}
