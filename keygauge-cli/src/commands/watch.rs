//! Watch command - collection cycles on an interval.

use anyhow::Result;
use clap::Args;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::info;

use super::collect::{CollectArgs, Cycle, print_report};
use super::load_runtime;
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between cycles (defaults to `general.watch_interval_secs`).
    #[arg(long, short)]
    pub interval: Option<u64>,

    #[command(flatten)]
    pub collect: CollectArgs,
}

/// Runs the watch command until interrupted.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let runtime = load_runtime(cli)?;
    let period = match args.interval {
        Some(0) => anyhow::bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => runtime.watch_interval,
    };
    let cycle = Cycle::new(&runtime, args.collect.should_push(&runtime.push))?;

    info!(interval_secs = period.as_secs(), "Starting watch mode");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch mode");
                return Ok(());
            }
        }

        let report = cycle.run().await;

        if cli.format == OutputFormat::Text {
            println!(
                "keygauge watch - {} (every {}s)",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                period.as_secs()
            );
        }
        print_report(&report, cli)?;
    }
}
