//! Provider kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::category::UsageCategory;
use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported API provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// CoinGecko Pro API
    CoinGecko,
    /// CoinMarketCap developer portal
    CoinMarketCap,
    /// QuickNode console
    QuickNode,
    /// Birdeye data services
    Birdeye,
    /// twitterapi.io
    TwitterApi,
    /// OpenAI organization
    OpenAi,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CoinGecko => "CoinGecko",
            Self::CoinMarketCap => "CoinMarketCap",
            Self::QuickNode => "QuickNode",
            Self::Birdeye => "Birdeye",
            Self::TwitterApi => "TwitterAPI.io",
            Self::OpenAi => "OpenAI",
        }
    }

    /// Returns the stable identifier used in config files and metric labels.
    pub fn id(&self) -> &'static str {
        match self {
            Self::CoinGecko => "coingecko",
            Self::CoinMarketCap => "coinmarketcap",
            Self::QuickNode => "quicknode",
            Self::Birdeye => "birdeye",
            Self::TwitterApi => "twitterapi",
            Self::OpenAi => "openai",
        }
    }

    /// Returns how this provider's usage/limit pair is interpreted.
    ///
    /// This is static configuration, never computed per request.
    pub fn usage_category(&self) -> UsageCategory {
        match self {
            Self::TwitterApi => UsageCategory::LongPeriodPackage,
            Self::CoinGecko
            | Self::CoinMarketCap
            | Self::QuickNode
            | Self::Birdeye
            | Self::OpenAi => UsageCategory::MonthlyCredits,
        }
    }

    /// Returns all available provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::CoinGecko,
            Self::CoinMarketCap,
            Self::QuickNode,
            Self::Birdeye,
            Self::TwitterApi,
            Self::OpenAi,
        ]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        match needle.as_str() {
            "cmc" => return Ok(Self::CoinMarketCap),
            "twitter" => return Ok(Self::TwitterApi),
            _ => {}
        }
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.id() == needle)
            .ok_or_else(|| CoreError::UnknownProvider(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
