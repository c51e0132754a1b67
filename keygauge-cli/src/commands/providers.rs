//! Providers command - list supported providers.

use anyhow::Result;
use keygauge_providers::ProviderRegistry;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub fn run(cli: &Cli) -> Result<()> {
    let providers = ProviderRegistry::all();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(90));
            for desc in providers {
                println!("{}", formatter.format_provider_line(desc));
            }
            println!();
            println!("Total: {} providers", providers.len());
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(providers)?);
        }
    }

    Ok(())
}
