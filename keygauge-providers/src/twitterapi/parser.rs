//! TwitterAPI response parser.

use keygauge_core::{LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Body of `GET /oapi/my/info`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TwitterApiBody {
    /// Account balance.
    Info(TwitterApiInfo),
    /// Error reported with a success status.
    Error(TwitterApiErrorBody),
}

/// Account balance.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterApiInfo {
    /// Credits left on the account.
    pub recharge_credits: u64,
}

/// Error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterApiErrorBody {
    /// Error code or short message.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reduces an info body to a metric.
///
/// # Errors
///
/// Returns [`FetchError::Upstream`] for an error payload and
/// [`FetchError::InvalidResponse`] for a body with neither shape.
pub fn info_metric(body: TwitterApiBody) -> Result<Metric, FetchError> {
    match body {
        TwitterApiBody::Info(info) => Ok(Metric::new(
            ProviderKind::TwitterApi,
            0,
            info.recharge_credits,
        )
        .with_limit_strategy(LimitStrategy::Direct)
        .with_detail("recharge_credits", info.recharge_credits)),
        TwitterApiBody::Error(TwitterApiErrorBody { error, message }) => {
            match (error, message) {
                (None, None) => Err(FetchError::missing_field("recharge_credits")),
                (Some(error), None) => Err(FetchError::Upstream(error)),
                (None, Some(message)) => Err(FetchError::Upstream(message)),
                (Some(error), Some(message)) => {
                    Err(FetchError::Upstream(format!("{error}: {message}")))
                }
            }
        }
    }
}

/// Parses a raw info body into a metric.
///
/// # Errors
///
/// Returns an error if the body is malformed or reports an upstream error.
pub fn parse_info_response(json_str: &str) -> Result<Metric, FetchError> {
    debug!(len = json_str.len(), "Parsing TwitterAPI info response");
    let body: TwitterApiBody = serde_json::from_str(json_str)?;
    info_metric(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygauge_core::Sample;

    #[test]
    fn test_parse_balance() {
        let metric = parse_info_response(r#"{"recharge_credits": 12345}"#).unwrap();

        assert_eq!(metric.usage, 0);
        assert_eq!(metric.limit, 12_345);
        assert_eq!(metric.detail["recharge_credits"], 12_345);

        let sample = Sample::of(&metric);
        assert_eq!(sample.values.remaining, 12_345);
        assert!(sample.values.used.is_none());
    }

    #[test]
    fn test_error_payload() {
        let err = parse_info_response(r#"{"error": "Unauthorized", "message": "bad key"}"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::Upstream(ref msg) if msg == "Unauthorized: bad key"));
    }

    #[test]
    fn test_unrecognized_body() {
        let err = parse_info_response(r#"{"balance": 10}"#).unwrap_err();
        assert!(matches!(err, FetchError::InvalidResponse(_)));
    }
}
