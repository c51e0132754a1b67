//! Birdeye response parser.

use keygauge_core::{LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Body of `POST /user/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Session token, absent when login is refused.
    #[serde(default)]
    pub token: Option<String>,
}

impl LoginResponse {
    /// Returns the session token.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Login`] if no token was issued.
    pub fn into_token(self) -> Result<String, FetchError> {
        self.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::Login("no token returned".to_string()))
    }
}

/// Body of `GET /accounts/default`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    /// False when the account lookup failed.
    pub success: bool,
    /// Account payload.
    pub data: AccountData,
}

/// Account payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    /// Active subscription.
    pub subscription: Subscription,
}

/// A billing subscription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription id, used in the usage path.
    #[serde(rename = "_id")]
    pub id: String,
    /// Subscribed plan.
    pub plan: Plan,
    /// Subscription status, e.g. `active`.
    pub status: String,
    /// Billing period start, RFC 3339.
    pub current_period_start_at: String,
    /// Billing period end, RFC 3339.
    pub current_period_end_at: String,
}

/// A Birdeye plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Compute units included per month.
    pub monthly_units: u64,
    /// Plan name.
    pub name: String,
}

/// Body of `GET /payments/subscriptions/{id}/usage`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// False when the usage lookup failed.
    pub success: bool,
    /// Usage payload.
    pub data: UsageData,
}

/// Compute units used this period.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageData {
    /// Total units.
    pub usage: u64,
    /// Units from REST calls.
    pub api_usage: u64,
    /// Units from websocket streams.
    pub ws_usage: u64,
    /// Units from CSV exports.
    pub csv_usage: u64,
    /// True once the plan is exceeded.
    pub has_overage: bool,
}

/// Returns the subscription of a successful account response.
///
/// # Errors
///
/// Returns [`FetchError::Upstream`] if the response is flagged unsuccessful.
pub fn subscription(account: &AccountResponse) -> Result<&Subscription, FetchError> {
    if !account.success {
        return Err(FetchError::Upstream("account lookup unsuccessful".to_string()));
    }
    Ok(&account.data.subscription)
}

/// Combines the subscription and its usage into a metric.
///
/// # Errors
///
/// Returns [`FetchError::Upstream`] if the usage response is flagged
/// unsuccessful.
pub fn usage_metric(subscription: &Subscription, usage: &UsageResponse) -> Result<Metric, FetchError> {
    if !usage.success {
        return Err(FetchError::Upstream("usage lookup unsuccessful".to_string()));
    }
    let data = &usage.data;

    Ok(
        Metric::new(ProviderKind::Birdeye, data.usage, subscription.plan.monthly_units)
            .with_limit_strategy(LimitStrategy::Direct)
            .with_detail("plan", subscription.plan.name.clone())
            .with_detail("subscription_status", subscription.status.clone())
            .with_detail("period_start", subscription.current_period_start_at.clone())
            .with_detail("period_end", subscription.current_period_end_at.clone())
            .with_detail("api_usage", data.api_usage)
            .with_detail("ws_usage", data.ws_usage)
            .with_detail("csv_usage", data.csv_usage)
            .with_detail("has_overage", data.has_overage),
    )
}

/// Parses raw account and usage bodies into a metric.
///
/// # Errors
///
/// Returns an error if either body is malformed or unsuccessful.
pub fn parse_usage_responses(account_json: &str, usage_json: &str) -> Result<Metric, FetchError> {
    debug!(
        account_len = account_json.len(),
        usage_len = usage_json.len(),
        "Parsing Birdeye responses"
    );
    let account: AccountResponse = serde_json::from_str(account_json)?;
    let usage: UsageResponse = serde_json::from_str(usage_json)?;
    usage_metric(subscription(&account)?, &usage)
}
