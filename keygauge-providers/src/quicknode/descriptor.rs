//! QuickNode provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::adapter::{DEFAULT_BASE_URL, QuickNodeAdapter};
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};

/// Describes the provider and how its keys are fetched.
pub fn quicknode_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::QuickNode,
        metadata: ProviderMetadata {
            display_name: "QuickNode",
            credential_hint: "Console API key",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://dashboard.quicknode.com/billing"),
            requires_admin_credential: false,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::Direct,
            build_task: build_quicknode_task,
        },
    }
}

fn build_quicknode_task(settings: &ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError> {
    Ok(standard_task(Arc::new(QuickNodeAdapter::new(settings)), settings))
}
