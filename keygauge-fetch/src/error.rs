//! Fetch error types.

use keygauge_core::CoreError;
use thiserror::Error;

// ============================================================================
// Error Class
// ============================================================================

/// Coarse classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Network failure, timeout, rate limit or 5xx. Eligible for retry.
    Transient,
    /// Auth failure, malformed credential, business error in the body.
    Permanent,
    /// Response parsed but a required field is missing or mistyped.
    Schema,
    /// A limit strategy's precondition does not hold.
    Derivation,
    /// The provider is misconfigured.
    Configuration,
}

impl ErrorClass {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::Schema => "schema",
            Self::Derivation => "derivation",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Non-success HTTP status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider reported an error inside a successful response.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Login step failed.
    #[error("Login failed: {0}")]
    Login(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Provider misconfiguration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Classifies this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Http(err) if err.is_decode() => ErrorClass::Schema,
            Self::Http(err) if err.is_builder() => ErrorClass::Permanent,
            Self::Http(_) | Self::Timeout(_) | Self::RateLimited { .. } => ErrorClass::Transient,
            Self::Status { status, .. } if *status >= 500 => ErrorClass::Transient,
            Self::Status { .. }
            | Self::AuthenticationFailed(_)
            | Self::Upstream(_)
            | Self::Login(_) => ErrorClass::Permanent,
            Self::InvalidResponse(_) | Self::Json(_) => ErrorClass::Schema,
            Self::Core(CoreError::Derivation(_)) => ErrorClass::Derivation,
            Self::Core(CoreError::InvalidConfig(_) | CoreError::UnknownProvider(_))
            | Self::InvalidUrl(_)
            | Self::Config(_) => ErrorClass::Configuration,
            Self::Core(CoreError::Serialization(_)) => ErrorClass::Schema,
        }
    }

    /// Returns true if a retry may succeed.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Shorthand for a missing required response field.
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidResponse(format!("missing required field `{field}`"))
    }
}

// ============================================================================
// Tests
// ============================================================================
