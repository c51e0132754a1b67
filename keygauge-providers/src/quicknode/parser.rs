//! QuickNode response parser.

use keygauge_core::{LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /v0/usage/rpc`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickNodeUsageEnvelope {
    /// Usage, absent on error.
    #[serde(default)]
    pub data: Option<QuickNodeUsage>,
    /// Error message; empty or absent on success.
    #[serde(default)]
    pub error: Option<String>,
}

/// RPC credit usage for the billing period.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickNodeUsage {
    /// Credits used this period.
    pub credits_used: u64,
    /// Credits left; negative in overage.
    pub credits_remaining: i64,
    /// Credit limit of the period.
    pub limit: u64,
    /// Credits used beyond the limit.
    #[serde(default)]
    pub overages: Option<u64>,
    /// Period start, in unix seconds.
    pub start_time: i64,
    /// Period end, in unix seconds.
    pub end_time: i64,
}

/// Reduces a usage envelope to a metric.
///
/// # Errors
///
/// Returns [`FetchError::Upstream`] if the envelope carries an error and
/// [`FetchError::InvalidResponse`] if it carries no data.
pub fn usage_metric(envelope: QuickNodeUsageEnvelope) -> Result<Metric, FetchError> {
    if let Some(error) = envelope.error.filter(|e| !e.is_empty()) {
        return Err(FetchError::Upstream(error));
    }
    let usage = envelope.data.ok_or_else(|| FetchError::missing_field("data"))?;

    Ok(
        Metric::new(ProviderKind::QuickNode, usage.credits_used, usage.limit)
            .with_limit_strategy(LimitStrategy::Direct)
            .with_detail("credits_remaining", usage.credits_remaining)
            .with_detail("overages", usage.overages.unwrap_or(0))
            .with_detail("start_time", usage.start_time)
            .with_detail("end_time", usage.end_time),
    )
}

/// Parses a raw usage body into a metric.
///
/// # Errors
///
/// Returns an error if the body is malformed or reports an upstream error.
pub fn parse_usage_response(json_str: &str) -> Result<Metric, FetchError> {
    debug!(len = json_str.len(), "Parsing QuickNode usage response");
    let envelope: QuickNodeUsageEnvelope = serde_json::from_str(json_str)?;
    usage_metric(envelope)
}
