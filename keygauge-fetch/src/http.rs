//! HTTP client with tracing and central status mapping.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing with secrets kept out of spans
//! - Hostname pinning for origins behind a CDN
//! - Mapping of HTTP statuses onto [`FetchError`] variants
//! - Typed JSON decoding of response bodies

use std::net::SocketAddr;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::context::FetchSettings;
use crate::error::FetchError;

/// User agent string for keygauge.
const USER_AGENT: &str = concat!("keygauge/", env!("CARGO_PKG_VERSION"));

/// Maximum number of body characters kept in a status error.
const MAX_ERROR_BODY_CHARS: usize = 200;

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper shared by all adapters of a cycle.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Creates a client from the cycle settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT);

        for (host, ip) in &settings.dns_overrides {
            debug!(host = %host, ip = %ip, "Pinning hostname");
            builder = builder.resolve(host, SocketAddr::new(*ip, 443));
        }

        Ok(Self {
            inner: builder.build()?,
            timeout_secs: settings.timeout.as_secs(),
        })
    }

    /// Performs a GET request and decodes the JSON body.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T, FetchError> {
        debug!("GET request");
        self.send_json(self.inner.get(url).headers(headers)).await
    }

    /// Performs a GET request with query parameters and decodes the JSON body.
    ///
    /// Query values are kept out of the span since some providers take
    /// session tokens as parameters.
    #[instrument(skip(self, headers, query), fields(url = %url))]
    pub async fn get_json_with_query<T, Q>(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &Q,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        debug!("GET request with query");
        self.send_json(self.inner.get(url).headers(headers).query(query))
            .await
    }

    /// Performs a POST request with a JSON body and decodes the JSON response.
    #[instrument(skip(self, headers, body), fields(url = %url))]
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST request with JSON");
        self.send_json(self.inner.post(url).headers(headers).json(body))
            .await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        debug!(status = %response.status(), "Response received");

        let response = check_status(response).await?;
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Http(error)
        }
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

/// Maps a non-success status onto the error taxonomy.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if response.is_rate_limited() {
        return Err(FetchError::RateLimited {
            retry_after: response.retry_after_secs(),
        });
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::AuthenticationFailed(format!(
            "Invalid or expired credentials ({status})"
        )));
    }

    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}

// ============================================================================
// Request Helpers
// ============================================================================

/// Joins a base URL and a relative path.
///
/// The base keeps its last path segment, so `https://host/v1` + `key`
/// yields `https://host/v1/key`.
///
/// # Errors
///
/// Returns an error if the base is not an absolute URL.
pub fn endpoint(base: &str, path: &str) -> Result<Url, FetchError> {
    let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Builds a header map from `(lowercase name, value)` pairs.
///
/// Every value is marked sensitive so it never shows up in debug output.
///
/// # Errors
///
/// Returns [`FetchError::AuthenticationFailed`] if a value is not a valid
/// header value, which only happens for malformed credentials.
pub fn header_map(pairs: &[(&'static str, &str)]) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let mut value = HeaderValue::from_str(value).map_err(|_| {
            FetchError::AuthenticationFailed(format!("credential is not a valid `{name}` value"))
        })?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), value);
    }
    Ok(headers)
}

/// Builds a bearer authorization header.
///
/// # Errors
///
/// Returns an error if the token is not a valid header value.
pub fn bearer(token: &str) -> Result<HeaderMap, FetchError> {
    let auth = format!("Bearer {token}");
    let mut headers = HeaderMap::new();
    let mut value = HeaderValue::from_str(&auth).map_err(|_| {
        FetchError::AuthenticationFailed("token is not a valid bearer value".to_string())
    })?;
    value.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, value);
    Ok(headers)
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================
