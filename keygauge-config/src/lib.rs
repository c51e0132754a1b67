// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `keygauge` Config
//!
//! Loads the configuration file once at startup and validates it into the
//! read-only runtime settings the collector consumes.
//!
//! ## Resolution
//!
//! 1. `--config <path>`
//! 2. `KEYGAUGE_CONFIG`
//! 3. `<config dir>/keygauge/config.json`
//!
//! Files ending in `.yaml` or `.yml` are read as YAML, anything else as JSON.
//! A missing file yields the defaults, with every provider disabled.
//!
//! ## Usage
//!
//! ```ignore
//! use keygauge_config::Config;
//!
//! let path = Config::resolve_path(cli.config.as_deref());
//! let runtime = Config::load_from(&path)?.into_runtime()?;
//! ```

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{
    Backoff, Config, CredentialValue, GeneralConfig, ProviderConfig, PushGatewayConfig,
    RetryConfig, CONFIG_ENV_VAR,
};
pub use error::ConfigError;
pub use runtime::{PushSettings, RuntimeConfig};
