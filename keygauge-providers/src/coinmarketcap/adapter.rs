//! CoinMarketCap usage adapter.

use async_trait::async_trait;
use keygauge_core::{Credential, LimitBands, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{FetchContext, FetchError, ProviderSettings, UsageAdapter, endpoint, header_map};
use reqwest::header::HeaderMap;
use tracing::{debug, info, instrument};

use super::parser::{PlanInfoResponse, UsageStats, stats_metric};

/// Developer portal API base URL.
pub const DEFAULT_BASE_URL: &str = "https://portal-api.coinmarketcap.com/v1";

const PORTAL_ORIGIN: &str = "https://pro.coinmarketcap.com";

fn portal_headers(session_token: &str) -> Result<HeaderMap, FetchError> {
    let cookie = format!("s={session_token}");
    let referer = format!("{PORTAL_ORIGIN}/");
    header_map(&[
        ("accept", "application/json"),
        ("cookie", cookie.as_str()),
        ("origin", PORTAL_ORIGIN),
        ("referer", referer.as_str()),
        ("x-requested-with", "xhr"),
    ])
}

/// Fetches one portal session's monthly credit usage.
#[derive(Debug, Clone)]
pub struct CoinMarketCapAdapter {
    base_url: String,
    bands: LimitBands,
}

impl CoinMarketCapAdapter {
    /// Creates an adapter honoring the configured base URL and band table.
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
            bands: settings.limit_bands.clone().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl UsageAdapter for CoinMarketCapAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::CoinMarketCap
    }

    fn limit_strategy(&self) -> LimitStrategy {
        LimitStrategy::HeuristicEstimated
    }

    #[instrument(skip_all, fields(key = %credential))]
    async fn fetch(
        &self,
        ctx: &FetchContext,
        credential: &Credential,
    ) -> Result<Metric, FetchError> {
        let stats_url = endpoint(&self.base_url, "accounts/my/plan/stats")?;
        let plan_url = endpoint(&self.base_url, "accounts/my/plan/info")?;
        let headers = portal_headers(credential.expose())?;

        let (stats, plan) = tokio::join!(
            ctx.http
                .get_json::<UsageStats>(stats_url.as_str(), headers.clone()),
            ctx.http
                .get_json::<PlanInfoResponse>(plan_url.as_str(), headers),
        );
        let stats = stats?;
        let plan = match plan {
            Ok(plan) => Some(plan),
            Err(e) => {
                debug!(error = %e, "Plan info unavailable, estimating limit");
                None
            }
        };

        let metric = stats_metric(&stats, plan.as_ref(), &self.bands);
        if metric.is_derived() {
            info!(usage = metric.usage, limit = metric.limit, "Limit estimated from usage");
        }
        Ok(metric)
    }
}
