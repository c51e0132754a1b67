//! Integration tests for metric normalization.

use keygauge_core::{
    Failure, LimitBands, LimitStrategy, Metric, ProviderKind, UsageCategory, allocate_cost,
};

#[test]
fn test_monthly_credits_remaining_and_ratio() {
    let metric = Metric::new(ProviderKind::QuickNode, 250, 1000);
    let values = ProviderKind::QuickNode.usage_category().derive(&metric);
    assert_eq!(values.remaining, 750);
    assert_eq!(values.ratio, Some(0.25));
}

#[test]
fn test_unknown_limit_is_not_an_error() {
    let metric = Metric::new(ProviderKind::OpenAi, 5, 0);
    assert!(metric.is_success());
    assert!(metric.has_unknown_limit());

    let values = UsageCategory::MonthlyCredits.derive(&metric);
    assert_eq!(values.used, Some(5));
    assert_eq!(values.limit, Some(0));
    assert_eq!(values.remaining, -5);
    assert!(values.ratio.is_none());
}

#[test]
fn test_failure_metric_derives_cleanly() {
    let metric = Metric::from_failure(
        ProviderKind::Birdeye,
        &Failure::new("user@...", "login failed"),
    );
    let values = UsageCategory::MonthlyCredits.derive(&metric);
    assert_eq!(values.remaining, 0);
    assert!(values.ratio.is_none());
}

#[test]
fn test_heuristic_metric_is_flagged() {
    let usage = 62_000;
    let limit = LimitBands::default().estimate(usage);
    let metric = Metric::new(ProviderKind::CoinMarketCap, usage, limit)
        .with_limit_strategy(LimitStrategy::HeuristicEstimated);

    assert_eq!(metric.limit, 300_000);
    assert!(metric.is_derived());
}

#[test]
fn test_cost_split_matches_usage_share() {
    let shares = allocate_cost(40.0, &[100, 300]).unwrap();
    assert_eq!(shares, vec![10, 30]);
    assert!(allocate_cost(40.0, &[0, 0]).is_err());
}
