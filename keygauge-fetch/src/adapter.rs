//! Provider adapter traits.
//!
//! An adapter turns one credential into one canonical [`Metric`] by running
//! whatever sequence of remote calls its provider requires.

use async_trait::async_trait;
use keygauge_core::{Credential, LimitStrategy, Metric, ProviderKind};

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Usage Adapter Trait
// ============================================================================

/// Fetches a usage snapshot for one credential of one provider.
///
/// ## Implementing an Adapter
///
/// ```ignore
/// struct ExampleAdapter {
///     base_url: String,
/// }
///
/// #[async_trait]
/// impl UsageAdapter for ExampleAdapter {
///     fn provider(&self) -> ProviderKind {
///         ProviderKind::QuickNode
///     }
///
///     fn limit_strategy(&self) -> LimitStrategy {
///         LimitStrategy::Direct
///     }
///
///     async fn fetch(&self, ctx: &FetchContext, credential: &Credential) -> Result<Metric, FetchError> {
///         let headers = header_map(&[("x-api-key", credential.expose())])?;
///         let body: UsageResponse = ctx.http.get_json(&self.base_url, headers).await?;
///         // Validate and reduce to (usage, limit)
///     }
/// }
/// ```
#[async_trait]
pub trait UsageAdapter: Send + Sync {
    /// The provider this adapter talks to.
    fn provider(&self) -> ProviderKind;

    /// The limit-resolution policy this adapter delegates to.
    fn limit_strategy(&self) -> LimitStrategy;

    /// Performs the provider's remote calls for `credential`.
    ///
    /// All steps must succeed; a missing required field is an error, never a
    /// defaulted value.
    async fn fetch(&self, ctx: &FetchContext, credential: &Credential)
    -> Result<Metric, FetchError>;
}

// ============================================================================
// Session Login Trait
// ============================================================================

/// Exchanges a raw credential for a session token.
///
/// Used by providers whose usage endpoints only accept a token obtained
/// from a login step. How the token is produced is opaque to the adapter;
/// it is only valid for the cycle that obtained it.
#[async_trait]
pub trait SessionLogin: Send + Sync {
    /// Returns a session token for `credential`.
    async fn login(&self, ctx: &FetchContext, credential: &Credential)
    -> Result<String, FetchError>;
}
