//! Config command - inspect or create the configuration file.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use keygauge_config::Config;
use serde::Serialize;
use tracing::info;

use super::load_runtime;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the configuration file in effect.
    Path,

    /// Validate the configuration and list enabled providers.
    Check,

    /// Write a template with every provider disabled.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Path => show_path(cli),
        ConfigAction::Check => check(cli),
        ConfigAction::Init { force } => init(*force, cli),
    }
}

fn show_path(cli: &Cli) -> Result<()> {
    let path = cli.config_path();
    let exists = path.exists();

    match cli.format {
        OutputFormat::Text => {
            let state = if exists { "exists" } else { "not found, defaults apply" };
            println!("Config file: {} ({state})", path.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": path.display().to_string(),
                "exists": exists,
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}

/// One enabled provider as reported by `config check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnabledProvider {
    provider: String,
    display_name: String,
    keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_key: Option<String>,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
}

fn check(cli: &Cli) -> Result<()> {
    let runtime = load_runtime(cli)?;

    let enabled: Vec<EnabledProvider> = runtime
        .providers
        .iter()
        .map(|settings| EnabledProvider {
            provider: settings.kind.id().to_string(),
            display_name: settings.kind.display_name().to_string(),
            keys: settings
                .credentials
                .as_slice()
                .iter()
                .map(|c| c.masked_id())
                .collect(),
            admin_key: settings.admin_credential.as_ref().map(|c| c.masked_id()),
            attempts: settings.retry.max_attempts,
            base_url: settings.base_url.clone(),
        })
        .collect();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration OK: {} provider(s) enabled", enabled.len());
            for provider in &enabled {
                println!(
                    "  • {:<15} {} key(s): {}",
                    provider.display_name,
                    provider.keys.len(),
                    provider.keys.join(", ")
                );
                if let Some(admin) = &provider.admin_key {
                    println!("    admin key: {admin}");
                }
                if let Some(url) = &provider.base_url {
                    println!("    base url:  {url}");
                }
            }
            let push = &runtime.push;
            let state = if push.enabled { "enabled" } else { "disabled" };
            println!("Push gateway: {} job={} ({state})", push.url, push.job);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "providers": enabled,
                "pushGateway": {
                    "enabled": runtime.push.enabled,
                    "url": runtime.push.url,
                    "job": runtime.push.job,
                },
                "watchIntervalSecs": runtime.watch_interval.as_secs(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}

fn init(force: bool, cli: &Cli) -> Result<()> {
    let path = cli.config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    Config::template()
        .save_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), "Template written");
    println!("Wrote template to {}", path.display());
    println!("Replace the YOUR_* placeholders and set `enabled: true` per provider.");
    Ok(())
}
