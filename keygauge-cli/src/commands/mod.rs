//! CLI command implementations.

pub mod collect;
pub mod config;
pub mod providers;
pub mod watch;

use anyhow::{Context, Result};
use keygauge_config::{Config, RuntimeConfig};

use crate::Cli;

/// Loads and validates the configuration file in effect.
pub fn load_runtime(cli: &Cli) -> Result<RuntimeConfig> {
    let path = cli.config_path();
    let config = Config::load_from(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config
        .into_runtime()
        .with_context(|| format!("validating {}", path.display()))
}
