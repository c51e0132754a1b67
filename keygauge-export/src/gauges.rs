//! Gauge families for API-key usage.

use keygauge_core::{Metric, Sample};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::error::ExportError;

/// Label names shared by every family, in order.
const LABELS: [&str; 3] = ["exported_service", "key_type", "usage_calculation"];

// ============================================================================
// Sink
// ============================================================================

/// Consumes the samples of one collection cycle.
pub trait MetricsSink: Send + Sync {
    /// Records one sample.
    fn record(&self, sample: &Sample<'_>);

    /// Records a whole cycle, replacing the previous one.
    fn record_cycle(&self, metrics: &[Metric]) {
        for metric in metrics {
            self.record(&Sample::of(metric));
        }
    }
}

// ============================================================================
// Prometheus Exporter
// ============================================================================

/// Owns a registry with the four usage gauge families.
#[derive(Clone)]
pub struct PrometheusExporter {
    registry: Registry,
    used: GaugeVec,
    limit: GaugeVec,
    remaining: GaugeVec,
    ratio: GaugeVec,
}

impl PrometheusExporter {
    /// Creates the exporter and registers its families.
    ///
    /// # Errors
    ///
    /// Returns an error if a family cannot be registered.
    pub fn new() -> Result<Self, ExportError> {
        let registry = Registry::new();
        let used = gauge(
            &registry,
            "apikey_requests_used_total",
            "Total number of API requests used for the given API key",
        )?;
        let limit = gauge(
            &registry,
            "apikey_requests_limit_total",
            "Total number of API requests allowed for the given API key",
        )?;
        let remaining = gauge(
            &registry,
            "apikey_requests_remaining_total",
            "Total number of API requests remaining for the given API key",
        )?;
        let ratio = gauge(
            &registry,
            "apikey_usage_ratio",
            "Ratio of used requests to total limit (0.0 to 1.0)",
        )?;

        Ok(Self {
            registry,
            used,
            limit,
            remaining,
            ratio,
        })
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Drops every recorded series.
    pub fn reset(&self) {
        self.used.reset();
        self.limit.reset();
        self.remaining.reset();
        self.ratio.reset();
    }

    /// Renders the registry in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl MetricsSink for PrometheusExporter {
    #[allow(clippy::cast_precision_loss)]
    fn record(&self, sample: &Sample<'_>) {
        let metric = sample.metric;
        let labels = [
            metric.provider.id(),
            metric.key_label(),
            sample.category.as_str(),
        ];
        let values = sample.values;

        if let Some(used) = values.used {
            self.used.with_label_values(&labels).set(used as f64);
        }
        if let Some(limit) = values.limit {
            self.limit.with_label_values(&labels).set(limit as f64);
        }
        self.remaining
            .with_label_values(&labels)
            .set(values.remaining as f64);
        if let Some(ratio) = values.ratio {
            self.ratio.with_label_values(&labels).set(ratio);
        }

        debug!(
            provider = %metric.provider,
            key = metric.key_label(),
            remaining = values.remaining,
            "Recorded sample"
        );
    }

    fn record_cycle(&self, metrics: &[Metric]) {
        self.reset();
        for metric in metrics {
            self.record(&Sample::of(metric));
        }
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec, ExportError> {
    let family = GaugeVec::new(Opts::new(name, help), &LABELS)?;
    registry.register(Box::new(family.clone()))?;
    Ok(family)
}

// ============================================================================
// Tests
// ============================================================================
