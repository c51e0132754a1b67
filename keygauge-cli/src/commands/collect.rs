//! Collect command - one collection cycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use keygauge_config::{PushSettings, RuntimeConfig};
use keygauge_export::{MetricsSink, PrometheusExporter, PushGateway, log_summary};
use keygauge_fetch::{CollectionReport, FetchContext, ProviderSettings};
use keygauge_providers::ProviderRegistry;
use tracing::{error, info, warn};

use super::load_runtime;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the collect command.
#[derive(Args, Default)]
pub struct CollectArgs {
    /// Push to the configured gateway even if pushing is disabled.
    #[arg(long, conflicts_with = "no_push")]
    pub push: bool,

    /// Never push.
    #[arg(long)]
    pub no_push: bool,
}

impl CollectArgs {
    /// Applies the command-line override to the configured push setting.
    pub fn should_push(&self, push: &PushSettings) -> bool {
        !self.no_push && (self.push || push.enabled)
    }
}

/// Runs the collect command.
pub async fn run(args: &CollectArgs, cli: &Cli) -> Result<()> {
    let runtime = load_runtime(cli)?;
    let cycle = Cycle::new(&runtime, args.should_push(&runtime.push))?;

    let report = cycle.run().await;
    print_report(&report, cli)
}

/// Prints a report in the selected format.
pub fn print_report(report: &CollectionReport, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_report(report));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_report(report)?);
        }
    }
    Ok(())
}

// ============================================================================
// Cycle
// ============================================================================

/// Everything one collection cycle needs, built once per process.
pub struct Cycle {
    ctx: Arc<FetchContext>,
    providers: Vec<ProviderSettings>,
    exporter: PrometheusExporter,
    gateway: Option<PushGateway>,
}

impl Cycle {
    /// Builds the HTTP client, the gauge registry and the push client.
    pub fn new(runtime: &RuntimeConfig, push: bool) -> Result<Self> {
        if runtime.providers.is_empty() {
            warn!("No providers enabled; run `keygauge config init` to create a template");
        }

        let ctx = FetchContext::new(runtime.fetch.clone()).context("building HTTP client")?;
        let gateway = if push {
            Some(
                PushGateway::new(&runtime.push.url, &runtime.push.job, runtime.fetch.timeout)
                    .context("building push gateway client")?,
            )
        } else {
            None
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            providers: runtime.providers.clone(),
            exporter: PrometheusExporter::new()?,
            gateway,
        })
    }

    /// Collects, records and optionally pushes. Push failures are logged only.
    pub async fn run(&self) -> CollectionReport {
        let (collector, rejected) = ProviderRegistry::build_collector(&self.providers);
        let mut report = collector.collect(&self.ctx).await;
        report.failed_providers.extend(rejected);

        self.exporter.record_cycle(&report.metrics);

        if let Some(gateway) = &self.gateway {
            if let Err(e) = gateway.push(&self.exporter).await {
                error!(error = %e, "Failed to push metrics");
            }
        }

        log_summary(self.exporter.registry());
        info!(
            metrics = report.metrics.len(),
            failed_keys = report.failure_count(),
            failed_providers = report.failed_providers.len(),
            duration_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "Collection cycle finished"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(enabled: bool) -> PushSettings {
        PushSettings {
            enabled,
            url: "http://localhost:9091".into(),
            job: "cron-apikey-usage".into(),
        }
    }

    #[test]
    fn test_push_follows_config_by_default() {
        let args = CollectArgs::default();
        assert!(args.should_push(&push(true)));
        assert!(!args.should_push(&push(false)));
    }

    #[test]
    fn test_push_overrides() {
        let forced = CollectArgs {
            push: true,
            no_push: false,
        };
        let suppressed = CollectArgs {
            push: false,
            no_push: true,
        };
        assert!(forced.should_push(&push(false)));
        assert!(!suppressed.should_push(&push(true)));
    }

    #[tokio::test]
    async fn test_empty_cycle() {
        let runtime = keygauge_config::Config::default()
            .into_runtime_with(|_| None)
            .unwrap();
        let cycle = Cycle::new(&runtime, false).unwrap();

        let report = cycle.run().await;

        assert!(report.metrics.is_empty());
        assert!(report.failed_providers.is_empty());
    }
}
