//! Export errors.

use thiserror::Error;

/// Errors raised while registering, rendering, or pushing metrics.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Registry or encoder error.
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The rendered exposition was not UTF-8.
    #[error("Exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Push-gateway URL could not be built.
    #[error("Invalid push gateway URL: {0}")]
    InvalidUrl(String),

    /// Transport failure talking to the push gateway.
    #[error("Push gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The push gateway answered with a non-success status.
    #[error("Push gateway returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
}
