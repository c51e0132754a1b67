//! Birdeye provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::adapter::{BirdeyeAdapter, DEFAULT_BASE_URL};
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};

/// Describes the provider and how its keys are fetched.
pub fn birdeye_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Birdeye,
        metadata: ProviderMetadata {
            display_name: "Birdeye",
            credential_hint: "Dashboard login as email:password",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://bds.birdeye.so/user/profile"),
            requires_admin_credential: false,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::Direct,
            build_task: build_birdeye_task,
        },
    }
}

fn build_birdeye_task(settings: &ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError> {
    Ok(standard_task(Arc::new(BirdeyeAdapter::new(settings)), settings))
}
