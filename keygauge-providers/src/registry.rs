//! Provider registry for managing all provider descriptors.
//!
//! The registry provides static access to all provider configurations
//! and turns runtime settings into collection tasks.

use std::sync::OnceLock;

use keygauge_core::ProviderKind;
use keygauge_fetch::{Collector, ProviderFailure, ProviderSettings};
use tracing::{debug, error};

use crate::birdeye::birdeye_descriptor;
use crate::coingecko::coingecko_descriptor;
use crate::coinmarketcap::coinmarketcap_descriptor;
use crate::descriptor::ProviderDescriptor;
use crate::openai::openai_descriptor;
use crate::quicknode::quicknode_descriptor;
use crate::twitterapi::twitterapi_descriptor;

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all provider descriptors.
static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

/// Initializes all provider descriptors, in [`ProviderKind::all`] order.
fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        coingecko_descriptor(),
        coinmarketcap_descriptor(),
        quicknode_descriptor(),
        birdeye_descriptor(),
        twitterapi_descriptor(),
        openai_descriptor(),
    ]
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of all provider descriptors.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all registered provider kinds.
    pub fn kinds() -> Vec<ProviderKind> {
        Self::all().iter().map(|d| d.id).collect()
    }

    /// Builds a collector for the enabled providers.
    ///
    /// Providers whose task cannot be built are returned as failures and
    /// left out of the collector; the rest still run.
    pub fn build_collector(settings: &[ProviderSettings]) -> (Collector, Vec<ProviderFailure>) {
        let mut collector = Collector::new();
        let mut rejected = Vec::new();

        for provider in settings {
            let built = Self::get(provider.kind)
                .ok_or_else(|| {
                    keygauge_fetch::FetchError::Config(format!(
                        "no adapter registered for {}",
                        provider.kind
                    ))
                })
                .and_then(|descriptor| descriptor.build_task(provider));

            match built {
                Ok(task) => {
                    debug!(provider = %provider.kind, keys = provider.credentials.len(), "Task built");
                    collector.add_task(task);
                }
                Err(e) => {
                    error!(provider = %provider.kind, error = %e, "Provider skipped");
                    rejected.push(ProviderFailure {
                        provider: provider.kind,
                        class: Some(e.class()),
                        error: e.to_string(),
                    });
                }
            }
        }

        (collector, rejected)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use keygauge_core::{Credential, LimitStrategy};
    use keygauge_fetch::{Credentials, ErrorClass};

    #[test]
    fn test_every_kind_registered() {
        assert_eq!(ProviderRegistry::count(), ProviderKind::all().len());
        for kind in ProviderKind::all() {
            let descriptor = ProviderRegistry::get(*kind).unwrap();
            assert_eq!(descriptor.id, *kind);
        }
        assert_eq!(ProviderRegistry::kinds(), ProviderKind::all().to_vec());
    }

    #[test]
    fn test_limit_strategies() {
        let strategy = |kind| ProviderRegistry::get(kind).unwrap().limit_strategy();
        assert_eq!(strategy(ProviderKind::CoinGecko), LimitStrategy::Direct);
        assert_eq!(
            strategy(ProviderKind::CoinMarketCap),
            LimitStrategy::HeuristicEstimated
        );
        assert_eq!(strategy(ProviderKind::OpenAi), LimitStrategy::CostProportional);
    }

    #[test]
    fn test_build_collector_rejects_openai_without_admin() {
        let settings = vec![
            ProviderSettings::new(
                ProviderKind::CoinGecko,
                Credentials::One(Credential::new("CG-0123456789abcdef")),
            ),
            ProviderSettings::new(
                ProviderKind::OpenAi,
                Credentials::Many(vec![Credential::new("sk-proj-0123456789abcdef")]),
            ),
        ];

        let (collector, rejected) = ProviderRegistry::build_collector(&settings);

        assert_eq!(collector.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].provider, ProviderKind::OpenAi);
        assert_eq!(rejected[0].class, Some(ErrorClass::Configuration));
    }
}
