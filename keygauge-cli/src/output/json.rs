//! JSON output formatting.

use anyhow::Result;
use keygauge_core::Sample;
use keygauge_fetch::CollectionReport;
use keygauge_providers::ProviderDescriptor;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one collection cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    pub metrics: Vec<MetricOutput>,
    pub failed_providers: Vec<FailedProviderOutput>,
    pub duration_ms: u64,
}

/// One metric with its derived quantities.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOutput {
    pub provider: String,
    pub key: String,
    pub category: String,
    pub success: bool,
    pub usage: u64,
    pub limit: u64,
    pub remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    pub derived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

/// A provider that produced no metrics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedProviderOutput {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub error: String,
}

/// Provider info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfoOutput {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub limit_strategy: String,
    pub credential: String,
    pub default_base_url: String,
    pub requires_admin_credential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a collection report.
    pub fn format_report(&self, report: &CollectionReport) -> Result<String> {
        self.format(&self.report_to_output(report))
    }

    /// Converts a report to output.
    pub fn report_to_output(&self, report: &CollectionReport) -> ReportOutput {
        ReportOutput {
            metrics: report
                .samples()
                .iter()
                .map(|sample| self.sample_to_output(sample))
                .collect(),
            failed_providers: report
                .failed_providers
                .iter()
                .map(|failure| FailedProviderOutput {
                    provider: failure.provider.id().to_string(),
                    class: failure.class.map(|class| class.to_string()),
                    error: failure.error.clone(),
                })
                .collect(),
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Converts a sample to output.
    fn sample_to_output(&self, sample: &Sample<'_>) -> MetricOutput {
        let metric = sample.metric;
        MetricOutput {
            provider: metric.provider.id().to_string(),
            key: metric.key_label().to_string(),
            category: sample.category.as_str().to_string(),
            success: metric.is_success(),
            usage: metric.usage,
            limit: metric.limit,
            remaining: sample.values.remaining,
            ratio: sample.values.ratio,
            derived: metric.is_derived(),
            error: metric.error().map(str::to_string),
            detail: metric
                .detail
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Formats provider list.
    pub fn format_providers(&self, providers: &[ProviderDescriptor]) -> Result<String> {
        let outputs: Vec<ProviderInfoOutput> = providers
            .iter()
            .map(|desc| ProviderInfoOutput {
                id: desc.id.id().to_string(),
                display_name: desc.display_name().to_string(),
                category: desc.category().as_str().to_string(),
                limit_strategy: desc.limit_strategy().as_str().to_string(),
                credential: desc.metadata.credential_hint.to_string(),
                default_base_url: desc.metadata.default_base_url.to_string(),
                requires_admin_credential: desc.metadata.requires_admin_credential,
                dashboard_url: desc.metadata.dashboard_url.map(str::to_string),
            })
            .collect();

        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================
