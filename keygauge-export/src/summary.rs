//! Log rendering of a registry.

use prometheus::Registry;
use tracing::info;

/// Logs every family and sample of the registry at info level.
pub fn log_summary(registry: &Registry) {
    info!("Collected metrics summary");
    for family in registry.gather() {
        info!(
            name = family.get_name(),
            kind = ?family.get_field_type(),
            help = family.get_help(),
            "Metric family"
        );
        for metric in family.get_metric() {
            let labels = metric
                .get_label()
                .iter()
                .map(|pair| format!("{}={}", pair.get_name(), pair.get_value()))
                .collect::<Vec<_>>()
                .join(", ");
            info!(
                "  {}({}) = {}",
                family.get_name(),
                labels,
                metric.get_gauge().get_value()
            );
        }
    }
}
