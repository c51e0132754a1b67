//! Canonical metric types.
//!
//! Every provider, whatever its response shape, is reduced to a [`Metric`].
//! A credential whose fetch failed is represented by a [`Failure`] which
//! converts 1:1 into a metric, so aggregation never sees a missing element.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::provider::ProviderKind;
use crate::limits::LimitStrategy;

/// Free-form detail bag attached to a metric.
pub type Detail = BTreeMap<String, Value>;

/// Detail key marking success or failure.
pub const DETAIL_SUCCESS: &str = "success";
/// Detail key holding the failure reason.
pub const DETAIL_ERROR: &str = "error";
/// Detail key marking an approximated limit or usage.
pub const DETAIL_DERIVED: &str = "derived";
/// Detail key naming the limit strategy.
pub const DETAIL_LIMIT_STRATEGY: &str = "limit_strategy";

// ============================================================================
// Metric
// ============================================================================

/// The normalized usage record for one (provider, credential) pair.
///
/// `usage` and `limit` are in the provider's native unit; only the ratio
/// within one record is meaningful. `limit == 0` means the limit is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Amount used in the provider's native unit.
    pub usage: u64,
    /// Amount allowed, or 0 when unknown.
    pub limit: u64,
    /// Provider this metric belongs to.
    pub provider: ProviderKind,
    /// Masked credential identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// Provider-specific extras plus the success marker.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detail: Detail,
}

impl Metric {
    /// Creates a metric with an empty detail bag.
    pub fn new(provider: ProviderKind, usage: u64, limit: u64) -> Self {
        Self {
            usage,
            limit,
            provider,
            credential_id: None,
            detail: Detail::new(),
        }
    }

    /// Sets the masked credential identifier.
    #[must_use]
    pub fn with_credential_id(mut self, id: impl Into<String>) -> Self {
        self.credential_id = Some(id.into());
        self
    }

    /// Adds a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    /// Records which limit strategy produced this metric.
    ///
    /// Heuristic and cost-proportional metrics are flagged `derived`.
    #[must_use]
    pub fn with_limit_strategy(self, strategy: LimitStrategy) -> Self {
        self.with_detail(DETAIL_LIMIT_STRATEGY, strategy.as_str())
            .with_detail(DETAIL_DERIVED, strategy.is_derived())
    }

    /// Marks this metric as a successful fetch.
    #[must_use]
    pub fn mark_success(self) -> Self {
        self.with_detail(DETAIL_SUCCESS, true)
    }

    /// Builds the failure-shaped metric for a failed credential.
    pub fn from_failure(provider: ProviderKind, failure: &Failure) -> Self {
        Self::new(provider, 0, 0)
            .with_credential_id(failure.credential_id.clone())
            .with_detail("api_key_id", failure.credential_id.clone())
            .with_detail(DETAIL_SUCCESS, false)
            .with_detail(DETAIL_ERROR, failure.error.clone())
    }

    /// Returns false only when the detail bag explicitly records a failure.
    pub fn is_success(&self) -> bool {
        self.detail
            .get(DETAIL_SUCCESS)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Returns the recorded failure reason, if any.
    pub fn error(&self) -> Option<&str> {
        self.detail.get(DETAIL_ERROR).and_then(Value::as_str)
    }

    /// Returns true if the usage or limit is an approximation.
    pub fn is_derived(&self) -> bool {
        self.detail
            .get(DETAIL_DERIVED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns true if the limit is unknown.
    pub fn has_unknown_limit(&self) -> bool {
        self.limit == 0
    }

    /// Label used for the credential dimension of emitted series.
    pub fn key_label(&self) -> &str {
        self.credential_id.as_deref().unwrap_or("primary")
    }
}

// ============================================================================
// Failure
// ============================================================================

/// A credential whose adapter call could not complete after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Masked credential identifier.
    pub credential_id: String,
    /// Human-readable reason.
    pub error: String,
}

impl Failure {
    /// Creates a new failure record.
    pub fn new(credential_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            credential_id: credential_id.into(),
            error: error.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
