//! TwitterAPI provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::adapter::{DEFAULT_BASE_URL, TwitterApiAdapter};
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};

/// Describes the provider and how its keys are fetched.
pub fn twitterapi_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::TwitterApi,
        metadata: ProviderMetadata {
            display_name: "TwitterAPI",
            credential_hint: "API key",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://twitterapi.io/dashboard"),
            requires_admin_credential: false,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::Direct,
            build_task: build_twitterapi_task,
        },
    }
}

fn build_twitterapi_task(settings: &ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError> {
    Ok(standard_task(Arc::new(TwitterApiAdapter::new(settings)), settings))
}
