//! Birdeye usage adapter.

use std::sync::Arc;

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{
    FetchContext, FetchError, ProviderSettings, SessionLogin, UsageAdapter, endpoint, header_map,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use super::login::BirdeyeLogin;
use super::parser::{AccountResponse, UsageResponse, subscription, usage_metric};

/// Dashboard API base URL.
pub const DEFAULT_BASE_URL: &str = "https://multichain-api.birdeye.so";

const DASHBOARD_ORIGIN: &str = "https://bds.birdeye.so";

/// Browser-style headers the dashboard API expects, plus a bearer token.
pub(super) fn dashboard_headers(bearer: Option<&str>) -> Result<HeaderMap, FetchError> {
    let referer = format!("{DASHBOARD_ORIGIN}/");
    let mut headers = header_map(&[
        ("accept", "application/json, text/plain, */*"),
        ("origin", DASHBOARD_ORIGIN),
        ("referer", referer.as_str()),
    ])?;
    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            FetchError::AuthenticationFailed("token is not a valid bearer value".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Fetches one dashboard account's monthly unit usage.
///
/// The bearer header carries the configured admin credential (a Birdeye
/// API key) when present, the session token otherwise.
pub struct BirdeyeAdapter {
    base_url: String,
    login: Arc<dyn SessionLogin>,
    api_key: Option<Credential>,
}

impl BirdeyeAdapter {
    /// Creates an adapter using the dashboard login.
    pub fn new(settings: &ProviderSettings) -> Self {
        let base_url = settings.base_url_or(DEFAULT_BASE_URL);
        Self {
            login: Arc::new(BirdeyeLogin::new(base_url.clone())),
            base_url,
            api_key: settings.admin_credential.clone(),
        }
    }

    /// Replaces the login step.
    #[must_use]
    pub fn with_login(mut self, login: Arc<dyn SessionLogin>) -> Self {
        self.login = login;
        self
    }
}

#[async_trait]
impl UsageAdapter for BirdeyeAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Birdeye
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
        let token = self.login.login(ctx, credential).await?;
        let bearer = self.api_key.as_ref().map_or(token.as_str(), Credential::expose);
        let query = [("token", token.as_str())];

        let url = endpoint(&self.base_url, "accounts/default")?;
        let account: AccountResponse = ctx
            .http
            .get_json_with_query(url.as_str(), dashboard_headers(Some(bearer))?, &query)
            .await?;
        let subscription = subscription(&account)?;
        debug!(plan = %subscription.plan.name, "Subscription resolved");

        let mut url = endpoint(&self.base_url, "payments/subscriptions")?;
        url.path_segments_mut()
            .map_err(|()| FetchError::Config(format!("{} cannot be a base", self.base_url)))?
            .push(&subscription.id)
            .push("usage");
        let usage: UsageResponse = ctx
            .http
            .get_json_with_query(url.as_str(), dashboard_headers(Some(bearer))?, &query)
            .await?;

        usage_metric(subscription, &usage)
    }
}

impl std::fmt::Debug for BirdeyeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BirdeyeAdapter")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}
