// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! keygauge CLI - API-key usage collection from the command line.
//!
//! # Examples
//!
//! ```bash
//! # One collection cycle, pushing if the config enables it
//! keygauge
//!
//! # One cycle, JSON output, never push
//! keygauge collect --no-push --format json --pretty
//!
//! # Repeat every 10 minutes
//! keygauge watch --interval 600
//!
//! # List providers
//! keygauge providers
//!
//! # Write a starter config
//! keygauge config init
//! ```

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use keygauge_config::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{collect, config, providers, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// keygauge CLI - API-key usage collection.
#[derive(Parser)]
#[command(name = "keygauge")]
#[command(about = "API-key usage collector for third-party API providers")]
#[command(long_about = r#"
keygauge queries the usage endpoints of third-party API providers for every
configured key, normalizes the results and exports them as Prometheus gauges.

Supported providers:
  • CoinGecko (coingecko)
  • QuickNode (quicknode)
  • CoinMarketCap (coinmarketcap)
  • Birdeye (birdeye)
  • TwitterAPI.io (twitterapi)
  • OpenAI (openai)

Examples:
  keygauge                          # One cycle with the configured push
  keygauge collect --no-push        # One cycle, print only
  keygauge --format json            # JSON output
  keygauge watch                    # Repeat on the configured interval
  keygauge config check             # Validate the configuration
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'collect' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to $KEYGAUGE_CONFIG, then the user config dir).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (debug logging).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Returns the configuration file in effect.
    pub fn config_path(&self) -> PathBuf {
        Config::resolve_path(self.config.as_deref())
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run one collection cycle (default if no command specified).
    #[command(visible_alias = "c")]
    Collect(collect::CollectArgs),

    /// Run collection cycles on an interval.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// List supported providers.
    #[command(visible_alias = "p")]
    Providers,

    /// Inspect or create the configuration file.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("keygauge=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Configured log level, or `info` when the file is missing or unreadable.
fn configured_log_level(cli: &Cli) -> String {
    Config::load_from(&cli.config_path())
        .map(|config| config.general.log_level)
        .unwrap_or_else(|_| "info".to_string())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, &configured_log_level(&cli));

    let result: Result<()> = match &cli.command {
        Some(Commands::Collect(args)) => collect::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Providers) => providers::run(&cli),
        Some(Commands::Config(args)) => config::run(args, &cli),
        None => collect::run(&collect::CollectArgs::default(), &cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
