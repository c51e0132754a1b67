//! Config error types.

use std::path::PathBuf;

use keygauge_core::{CoreError, ProviderKind};
use thiserror::Error;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `providers` key that names no known provider.
    #[error("Unknown provider `{0}`")]
    UnknownProvider(String),

    /// An enabled provider without any credential source.
    #[error("{0} is enabled but no credentials are configured")]
    NoCredentials(ProviderKind),

    /// An enabled provider still carrying a template credential.
    #[error("{0} is enabled but its credential is still a placeholder")]
    Placeholder(ProviderKind),

    /// A referenced environment variable is not set.
    #[error("{provider}: environment variable `{var}` is not set")]
    MissingEnv {
        /// Provider the variable belongs to.
        provider: ProviderKind,
        /// Variable name.
        var: String,
    },

    /// Any other invalid value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Core error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
