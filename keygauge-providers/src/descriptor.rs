//! Provider descriptor system.
//!
//! A descriptor contains all the static configuration for a provider:
//! - Metadata (display name, credential hint, URLs)
//! - Fetch plan (limit strategy and how to build the collection task)

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind, UsageCategory};
use keygauge_fetch::{
    FetchError, ProviderSettings, ProviderTask, RetryingAdapter, UsageAdapter, task_for,
};

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a provider.
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Display metadata.
    pub metadata: ProviderMetadata,
    /// How to fetch usage data.
    pub fetch_plan: FetchPlan,
}

impl ProviderDescriptor {
    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        self.metadata.display_name
    }

    /// Returns the usage category of the provider.
    pub fn category(&self) -> UsageCategory {
        self.id.usage_category()
    }

    /// Returns the limit strategy the provider's adapter uses.
    pub fn limit_strategy(&self) -> LimitStrategy {
        self.fetch_plan.limit_strategy
    }

    /// Builds the collection task for this provider.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if the settings belong to another
    /// provider or lack something the provider requires.
    pub fn build_task(
        &self,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn ProviderTask>, FetchError> {
        if settings.kind != self.id {
            return Err(FetchError::Config(format!(
                "settings for {} handed to {}",
                settings.kind, self.id
            )));
        }
        (self.fetch_plan.build_task)(settings)
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .field("limit_strategy", &self.fetch_plan.limit_strategy)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Static display metadata for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Human-readable name.
    pub display_name: &'static str,
    /// What the configured credential is.
    pub credential_hint: &'static str,
    /// API base URL used unless overridden.
    pub default_base_url: &'static str,
    /// Where a user can check usage by hand.
    pub dashboard_url: Option<&'static str>,
    /// Whether an organization-level credential is required.
    pub requires_admin_credential: bool,
}

// ============================================================================
// Fetch Plan
// ============================================================================

/// Configuration for how to fetch usage data.
pub struct FetchPlan {
    /// Limit-resolution policy of the provider's adapter.
    pub limit_strategy: LimitStrategy,
    /// Function to build the collection task.
    pub build_task: fn(&ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError>,
}

/// Wraps `adapter` in the provider's retry policy and picks the task shape
/// from the configured credentials.
pub fn standard_task(
    adapter: Arc<dyn UsageAdapter>,
    settings: &ProviderSettings,
) -> Arc<dyn ProviderTask> {
    let adapter: Arc<dyn UsageAdapter> =
        Arc::new(RetryingAdapter::new(adapter, settings.retry.clone()));
    task_for(adapter, settings.credentials.clone())
}
