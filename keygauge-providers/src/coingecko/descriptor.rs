//! CoinGecko provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::adapter::{CoinGeckoAdapter, DEFAULT_BASE_URL};
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};

/// Describes the provider and how its keys are fetched.
pub fn coingecko_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::CoinGecko,
        metadata: ProviderMetadata {
            display_name: "CoinGecko",
            credential_hint: "Pro API key",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://www.coingecko.com/en/developers/dashboard"),
            requires_admin_credential: false,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::Direct,
            build_task: build_coingecko_task,
        },
    }
}

fn build_coingecko_task(settings: &ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError> {
    Ok(standard_task(Arc::new(CoinGeckoAdapter::new(settings)), settings))
}
