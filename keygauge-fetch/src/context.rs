//! Fetch context and runtime provider settings.
//!
//! The fetch context is passed to every adapter and bundles the shared
//! HTTP client with the cycle-wide settings. Provider settings are the
//! validated, read-only view of one enabled provider's configuration.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use keygauge_core::{Credential, LimitBands, ProviderKind};

use crate::error::FetchError;
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings shared by every request of a collection cycle.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Timeout applied to each HTTP request.
    pub timeout: Duration,
    /// Hostnames pinned to fixed addresses.
    pub dns_overrides: BTreeMap<String, IpAddr>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            dns_overrides: BTreeMap::new(),
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pins a hostname to an address.
    #[must_use]
    pub fn with_dns_override(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.dns_overrides.insert(host.into(), ip);
        self
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// The credential shape configured for a provider.
///
/// A single credential is fetched directly; a list goes through the key
/// processor and yields one metric per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Exactly one credential.
    One(Credential),
    /// An ordered list of credentials. May be empty if misconfigured.
    Many(Vec<Credential>),
}

impl Credentials {
    /// Returns all credentials as a slice.
    pub fn as_slice(&self) -> &[Credential] {
        match self {
            Self::One(credential) => std::slice::from_ref(credential),
            Self::Many(list) => list,
        }
    }

    /// Returns the number of credentials.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if no credential is configured.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

// ============================================================================
// Provider Settings
// ============================================================================

/// Runtime settings for one enabled provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// The provider.
    pub kind: ProviderKind,
    /// Credentials to collect.
    pub credentials: Credentials,
    /// Organization-level credential, for providers that need one.
    pub admin_credential: Option<Credential>,
    /// Retry policy for each credential's adapter call.
    pub retry: RetryPolicy,
    /// Overrides the provider's API base URL.
    pub base_url: Option<String>,
    /// Overrides the heuristic band table.
    pub limit_bands: Option<LimitBands>,
    /// Overrides the provider-mandated pause between sequential calls.
    pub request_pause: Option<Duration>,
}

impl ProviderSettings {
    /// Creates settings with the default retry policy and no overrides.
    pub fn new(kind: ProviderKind, credentials: Credentials) -> Self {
        Self {
            kind,
            credentials,
            admin_credential: None,
            retry: RetryPolicy::default(),
            base_url: None,
            limit_bands: None,
            request_pause: None,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the admin credential.
    #[must_use]
    pub fn with_admin_credential(mut self, credential: Credential) -> Self {
        self.admin_credential = Some(credential);
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Returns the configured base URL, or `default` without a trailing slash.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to adapters, giving access to the HTTP client.
#[derive(Debug)]
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context, building an HTTP client from the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let http = HttpClient::new(&settings)?;
        Ok(Self::with_http(Arc::new(http), settings))
    }

    /// Creates a context around an existing client.
    pub fn with_http(http: Arc<HttpClient>, settings: FetchSettings) -> Self {
        Self { http, settings }
    }

    /// Returns the effective timeout for HTTP requests.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_shape() {
        let one = Credentials::One(Credential::new("key-a"));
        assert_eq!(one.len(), 1);

        let empty = Credentials::Many(Vec::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_base_url_override() {
        let settings = ProviderSettings::new(
            ProviderKind::QuickNode,
            Credentials::One(Credential::new("key")),
        );
        assert_eq!(
            settings.base_url_or("https://api.quicknode.com"),
            "https://api.quicknode.com"
        );

        let settings = settings.with_base_url("http://127.0.0.1:8080/");
        assert_eq!(settings.base_url_or("https://unused"), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_default_context() {
        let ctx = FetchContext::new(FetchSettings::default()).unwrap();
        assert_eq!(ctx.timeout(), Duration::from_secs(30));
    }
}
