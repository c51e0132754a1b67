//! CoinGecko response parser.

use keygauge_core::{LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /key`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoKeyResponse {
    /// Plan name, e.g. `Analyst`.
    pub plan: String,
    /// Per-minute request cap.
    pub rate_limit_request_per_minute: u64,
    /// Monthly call credit of the plan.
    pub monthly_call_credit: u64,
    /// Calls made this month.
    pub current_total_monthly_calls: u64,
    /// Goes negative once the key runs into overage.
    pub current_remaining_monthly_calls: i64,
}

/// Reduces a key response to a metric.
///
/// Usage is `credit - remaining` rather than the reported call total, which
/// lags behind on CoinGecko's side.
pub fn key_metric(response: &CoinGeckoKeyResponse) -> Metric {
    let used = i128::from(response.monthly_call_credit)
        - i128::from(response.current_remaining_monthly_calls);
    let used = u64::try_from(used.max(0)).unwrap_or(u64::MAX);

    Metric::new(ProviderKind::CoinGecko, used, response.monthly_call_credit)
        .with_limit_strategy(LimitStrategy::Direct)
        .with_detail("plan", response.plan.clone())
        .with_detail("monthly_total_calls", response.current_total_monthly_calls)
        .with_detail("monthly_call_credit", response.monthly_call_credit)
        .with_detail(
            "monthly_remaining_credits",
            response.current_remaining_monthly_calls,
        )
        .with_detail(
            "rate_limit_request_per_minute",
            response.rate_limit_request_per_minute,
        )
}

/// Parses a raw `GET /key` body into a metric.
///
/// # Errors
///
/// Returns an error if the body is not JSON or a required field is missing.
pub fn parse_key_response(json_str: &str) -> Result<Metric, FetchError> {
    debug!(len = json_str.len(), "Parsing CoinGecko key response");
    let response: CoinGeckoKeyResponse = serde_json::from_str(json_str)?;
    Ok(key_metric(&response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygauge_fetch::ErrorClass;

    #[test]
    fn test_parse_key_response() {
        let json = r#"{
            "plan": "Analyst",
            "rate_limit_request_per_minute": 500,
            "monthly_call_credit": 500000,
            "current_total_monthly_calls": 120340,
            "current_remaining_monthly_calls": 379000
        }"#;

        let metric = parse_key_response(json).unwrap();

        assert_eq!(metric.usage, 121_000);
        assert_eq!(metric.limit, 500_000);
        assert_eq!(metric.detail["plan"], "Analyst");
        assert_eq!(metric.detail["monthly_total_calls"], 120_340);
        assert!(!metric.is_derived());
    }

    #[test]
    fn test_overage_exceeds_credit() {
        let json = r#"{
            "plan": "Lite",
            "rate_limit_request_per_minute": 500,
            "monthly_call_credit": 1000,
            "current_total_monthly_calls": 1200,
            "current_remaining_monthly_calls": -200
        }"#;

        let metric = parse_key_response(json).unwrap();
        assert_eq!(metric.usage, 1200);
        assert_eq!(metric.limit, 1000);
    }

    #[test]
    fn test_missing_credit_is_schema_error() {
        let json = r#"{"plan": "Lite", "current_remaining_monthly_calls": 10}"#;
        let err = parse_key_response(json).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Schema);
    }
}
