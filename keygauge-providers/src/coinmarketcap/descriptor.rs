//! CoinMarketCap provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::adapter::{CoinMarketCapAdapter, DEFAULT_BASE_URL};
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};

/// Describes the provider and how its keys are fetched.
pub fn coinmarketcap_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::CoinMarketCap,
        metadata: ProviderMetadata {
            display_name: "CoinMarketCap",
            credential_hint: "Developer portal session token (`s` cookie)",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://pro.coinmarketcap.com/account"),
            requires_admin_credential: false,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::HeuristicEstimated,
            build_task: build_coinmarketcap_task,
        },
    }
}

fn build_coinmarketcap_task(
    settings: &ProviderSettings,
) -> Result<Arc<dyn ProviderTask>, FetchError> {
    Ok(standard_task(Arc::new(CoinMarketCapAdapter::new(settings)), settings))
}
