//! Usage categories and the quantities derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::metric::Metric;

// ============================================================================
// Usage Category
// ============================================================================

/// How a provider's usage/limit pair is interpreted when emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCategory {
    /// Usage counts up to the limit and resets monthly.
    MonthlyCredits,
    /// Only the remaining balance is meaningful.
    LongPeriodPackage,
}

impl UsageCategory {
    /// Returns the label value used in emitted series.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthlyCredits => "monthly_credits",
            Self::LongPeriodPackage => "long_period_package",
        }
    }

    /// Computes the quantities emitted for a metric under this category.
    ///
    /// `ratio` is only present for monthly credits with a non-zero limit.
    pub fn derive(&self, metric: &Metric) -> DerivedValues {
        let remaining = signed(metric.limit) - signed(metric.usage);
        match self {
            Self::MonthlyCredits => DerivedValues {
                used: Some(metric.usage),
                limit: Some(metric.limit),
                remaining,
                ratio: usage_ratio(metric.usage, metric.limit),
            },
            Self::LongPeriodPackage => DerivedValues {
                used: None,
                limit: None,
                remaining,
                ratio: None,
            },
        }
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Derived Values
// ============================================================================

/// Quantities handed to the metrics sink for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedValues {
    /// Amount used, when tracked by the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
    /// Limit, when tracked by the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// `limit - used`; negative when usage exceeds a known or unknown limit.
    pub remaining: i64,
    /// `used / limit` rounded to 4 decimals; absent when the limit is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
}

// ============================================================================
// Sample
// ============================================================================

/// A metric paired with its provider's category and derived quantities.
///
/// This is what the metrics sink consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    /// The metric.
    pub metric: &'a Metric,
    /// Category of the metric's provider.
    pub category: UsageCategory,
    /// Quantities derived under that category.
    pub values: DerivedValues,
}

impl<'a> Sample<'a> {
    /// Derives the sample for a metric.
    pub fn of(metric: &'a Metric) -> Self {
        let category = metric.provider.usage_category();
        Self {
            metric,
            category,
            values: category.derive(metric),
        }
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn usage_ratio(used: u64, limit: u64) -> Option<f64> {
    if limit == 0 {
        return None;
    }
    let ratio = used as f64 / limit as f64;
    Some((ratio * 10_000.0).round() / 10_000.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderKind;

    #[test]
    fn test_monthly_credits_derivation() {
        let metric = Metric::new(ProviderKind::CoinGecko, 250, 1000);
        let values = UsageCategory::MonthlyCredits.derive(&metric);

        assert_eq!(values.used, Some(250));
        assert_eq!(values.limit, Some(1000));
        assert_eq!(values.remaining, 750);
        assert_eq!(values.ratio, Some(0.25));
    }

    #[test]
    fn test_zero_limit_has_no_ratio() {
        let metric = Metric::new(ProviderKind::CoinMarketCap, 5, 0);
        let values = UsageCategory::MonthlyCredits.derive(&metric);

        assert_eq!(values.remaining, -5);
        assert!(values.ratio.is_none());
        let json = serde_json::to_value(values).unwrap();
        assert!(json.get("ratio").is_none());
    }

    #[test]
    fn test_package_emits_only_remaining() {
        let metric = Metric::new(ProviderKind::TwitterApi, 0, 12_345);
        let values = UsageCategory::LongPeriodPackage.derive(&metric);

        assert_eq!(values.remaining, 12_345);
        assert!(values.used.is_none());
        assert!(values.limit.is_none());
        assert!(values.ratio.is_none());
    }

    #[test]
    fn test_ratio_rounding() {
        let metric = Metric::new(ProviderKind::QuickNode, 1, 3);
        let values = UsageCategory::MonthlyCredits.derive(&metric);
        assert_eq!(values.ratio, Some(0.3333));
    }

    #[test]
    fn test_sample_uses_provider_category() {
        let metric = Metric::new(ProviderKind::TwitterApi, 0, 800);
        let sample = Sample::of(&metric);
        assert_eq!(sample.category, UsageCategory::LongPeriodPackage);
        assert_eq!(sample.values.remaining, 800);
    }

    #[test]
    fn test_labels() {
        assert_eq!(UsageCategory::MonthlyCredits.to_string(), "monthly_credits");
        assert_eq!(
            serde_json::to_string(&UsageCategory::LongPeriodPackage).unwrap(),
            "\"long_period_package\""
        );
    }
}
