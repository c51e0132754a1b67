//! CoinGecko usage adapter.

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{FetchContext, FetchError, ProviderSettings, UsageAdapter, endpoint, header_map};
use tracing::{debug, instrument};

use super::parser::{CoinGeckoKeyResponse, key_metric};

/// Pro API base URL.
pub const DEFAULT_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Fetches one Pro API key's monthly credit usage.
#[derive(Debug, Clone)]
pub struct CoinGeckoAdapter {
    base_url: String,
}

impl CoinGeckoAdapter {
    /// Creates an adapter honoring the configured base URL.
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        }
    }
}

#[async_trait]
impl UsageAdapter for CoinGeckoAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::CoinGecko
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
        let url = endpoint(&self.base_url, "key")?;
        let headers = header_map(&[
            ("accept", "application/json"),
            ("x-cg-pro-api-key", credential.expose()),
        ])?;

        let response: CoinGeckoKeyResponse = ctx.http.get_json(url.as_str(), headers).await?;
        debug!(plan = %response.plan, "Key info received");
        Ok(key_metric(&response))
    }
}
