//! Core error types for `keygauge`.

use thiserror::Error;

/// Core error type for `keygauge` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown provider identifier.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A limit strategy's precondition does not hold.
    #[error("Cannot derive limit: {0}")]
    Derivation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
