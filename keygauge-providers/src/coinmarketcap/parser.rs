//! CoinMarketCap response parser.

use keygauge_core::{LimitBands, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /accounts/my/plan/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageStats {
    /// Today so far.
    pub day: DayStats,
    /// Yesterday.
    pub yesterday: DayStats,
    /// Current month so far.
    pub month: DayStats,
    /// Previous month.
    pub last_month: DayStats,
}

/// Call and credit counters for one period.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DayStats {
    /// Credits consumed.
    pub credits_used: u64,
    /// All calls, cached ones included.
    pub total_calls_count: u64,
    /// Calls that hit the backend.
    pub unique_calls_count: u64,
}

/// Body of `GET /accounts/my/plan/info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanInfoResponse {
    /// Plan attached to the key.
    #[serde(default, rename = "keyPlan")]
    pub key_plan: Option<KeyPlan>,
}

/// Plan section of the key info.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyPlan {
    /// Limits of the plan.
    #[serde(default)]
    pub plan: Option<PlanLimits>,
}

/// Credit limits of a plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanLimits {
    /// Monthly credit limit.
    #[serde(default)]
    pub limit_monthly: Option<u64>,
    /// Plan label.
    #[serde(default)]
    pub label: Option<String>,
}

impl PlanInfoResponse {
    /// Returns the monthly credit limit if the plan reports a positive one.
    pub fn monthly_limit(&self) -> Option<u64> {
        self.plan()
            .and_then(|plan| plan.limit_monthly)
            .filter(|limit| *limit > 0)
    }

    /// Returns the plan label.
    pub fn label(&self) -> Option<&str> {
        self.plan().and_then(|plan| plan.label.as_deref())
    }

    fn plan(&self) -> Option<&PlanLimits> {
        self.key_plan.as_ref().and_then(|key| key.plan.as_ref())
    }
}

/// Picks the monthly limit for `usage`.
///
/// A positive plan limit wins; otherwise the first band whose threshold is
/// at least `usage` supplies the limit.
pub fn resolve_limit(
    usage: u64,
    plan: Option<&PlanInfoResponse>,
    bands: &LimitBands,
) -> (u64, LimitStrategy) {
    match plan.and_then(PlanInfoResponse::monthly_limit) {
        Some(limit) => (limit, LimitStrategy::Direct),
        None => (bands.estimate(usage), LimitStrategy::HeuristicEstimated),
    }
}

/// Reduces the stats, and the plan if it was retrieved, to a metric.
pub fn stats_metric(
    stats: &UsageStats,
    plan: Option<&PlanInfoResponse>,
    bands: &LimitBands,
) -> Metric {
    let usage = stats.month.credits_used;
    let (limit, strategy) = resolve_limit(usage, plan, bands);

    let mut metric = Metric::new(ProviderKind::CoinMarketCap, usage, limit)
        .with_limit_strategy(strategy)
        .with_detail("day_credits_used", stats.day.credits_used)
        .with_detail("yesterday_credits_used", stats.yesterday.credits_used)
        .with_detail("last_month_credits_used", stats.last_month.credits_used)
        .with_detail("month_total_calls", stats.month.total_calls_count);
    if let Some(label) = plan.and_then(PlanInfoResponse::label) {
        metric = metric.with_detail("plan", label);
    }
    metric
}

/// Parses a raw stats body into a metric, estimating the limit.
///
/// # Errors
///
/// Returns an error if the body is malformed.
pub fn parse_stats_response(json_str: &str, bands: &LimitBands) -> Result<Metric, FetchError> {
    debug!(len = json_str.len(), "Parsing CoinMarketCap stats response");
    let stats: UsageStats = serde_json::from_str(json_str)?;
    Ok(stats_metric(&stats, None, bands))
}
