//! CLI output formatting tests.
//!
//! These tests verify that collection reports render correctly in both
//! text and JSON output modes.

use std::time::Duration;

use keygauge_core::{Failure, LimitStrategy, Metric, ProviderKind};
use keygauge_fetch::{CollectionReport, ErrorClass, ProviderFailure};

fn report() -> CollectionReport {
    CollectionReport {
        metrics: vec![
            Metric::new(ProviderKind::QuickNode, 2_500, 10_000)
                .with_credential_id("qn-key-abc...9f3e")
                .with_limit_strategy(LimitStrategy::Direct)
                .mark_success(),
            Metric::new(ProviderKind::CoinMarketCap, 62_000, 300_000)
                .with_limit_strategy(LimitStrategy::HeuristicEstimated)
                .mark_success(),
            Metric::new(ProviderKind::TwitterApi, 0, 48_000).mark_success(),
            Metric::from_failure(
                ProviderKind::QuickNode,
                &Failure::new("qn-key-def...1a2b", "authentication failed: invalid key"),
            ),
        ],
        failed_providers: vec![ProviderFailure {
            provider: ProviderKind::Birdeye,
            class: Some(ErrorClass::Permanent),
            error: "login rejected".into(),
        }],
        duration: Duration::from_millis(1_300),
    }
}

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use super::report;

    #[test]
    fn test_report_lists_every_metric() {
        let output = TextFormatter::new(false).format_report(&report());

        assert!(output.contains("QuickNode"));
        assert!(output.contains("qn-key-abc...9f3e"));
        assert!(output.contains("2,500/10,000 (25.0% used)"));
        assert!(output.contains("48,000 remaining"));
        assert!(output.contains("✗ authentication failed: invalid key"));
    }

    #[test]
    fn test_estimated_limit_is_marked() {
        let output = TextFormatter::new(false).format_report(&report());
        let cmc = output
            .lines()
            .find(|line| line.starts_with("CoinMarketCap"))
            .unwrap();

        assert!(cmc.contains("(estimated)"));
        assert!(cmc.contains("primary"));
    }

    #[test]
    fn test_failed_providers_section() {
        let output = TextFormatter::new(false).format_report(&report());

        assert!(output.contains("Failed providers"));
        assert!(output.contains("[permanent] login rejected"));
        assert!(output.contains("3 ok, 1 failed key(s), 1 failed provider(s) in 1.3s"));
    }

    #[test]
    fn test_no_colors_when_disabled() {
        let output = TextFormatter::new(false).format_report(&report());
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn test_colors_when_enabled() {
        let output = TextFormatter::new(true).format_report(&report());
        assert!(output.contains("\x1b[31m"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use super::report;
    use keygauge_providers::ProviderRegistry;

    #[test]
    fn test_report_shape() {
        let output = JsonFormatter::new(false).format_report(&report()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["metrics"].as_array().unwrap().len(), 4);
        assert_eq!(json["durationMs"], 1300);
        assert_eq!(json["failedProviders"][0]["provider"], "birdeye");
        assert_eq!(json["failedProviders"][0]["class"], "permanent");
    }

    #[test]
    fn test_metric_fields() {
        let output = JsonFormatter::new(false).format_report(&report()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        let quicknode = &json["metrics"][0];

        assert_eq!(quicknode["provider"], "quicknode");
        assert_eq!(quicknode["category"], "monthly_credits");
        assert_eq!(quicknode["remaining"], 7500);
        assert_eq!(quicknode["ratio"], 0.25);
        assert_eq!(quicknode["derived"], false);
        assert!(quicknode.get("error").is_none());

        let failed = &json["metrics"][3];
        assert_eq!(failed["success"], false);
        assert!(failed.get("ratio").is_none());
        assert_eq!(failed["error"], "authentication failed: invalid key");
    }

    #[test]
    fn test_package_metric_has_no_ratio() {
        let formatter = JsonFormatter::new(false);
        let output = formatter.report_to_output(&report());
        let twitter = &output.metrics[2];

        assert_eq!(twitter.category, "long_period_package");
        assert_eq!(twitter.remaining, 48_000);
        assert!(twitter.ratio.is_none());
    }

    #[test]
    fn test_providers_listing() {
        let output = JsonFormatter::new(false)
            .format_providers(ProviderRegistry::all())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        let openai = json
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"] == "openai")
            .unwrap();
        assert_eq!(openai["limitStrategy"], "cost_proportional");
        assert_eq!(openai["requiresAdminCredential"], true);
    }
}
