// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `keygauge` Providers
//!
//! Adapters for every supported API-key provider, plus the registry that
//! turns runtime settings into collection tasks.
//!
//! ## Supported Providers
//!
//! | Provider | Credential | Limit strategy | Category |
//! |----------|------------|----------------|----------|
//! | CoinGecko | Pro API key | direct | monthly credits |
//! | CoinMarketCap | portal session token | plan limit, else heuristic | monthly credits |
//! | QuickNode | API key | direct | monthly credits |
//! | Birdeye | `email:password` | direct | monthly credits |
//! | TwitterAPI | API key | direct | long-period package |
//! | OpenAI | project keys + admin key | cost-proportional | monthly credits |
//!
//! ## Usage
//!
//! ```ignore
//! use keygauge_providers::ProviderRegistry;
//!
//! let (collector, rejected) = ProviderRegistry::build_collector(&settings);
//! let report = collector.collect(&ctx).await;
//! ```

pub mod descriptor;
pub mod registry;

pub mod birdeye;
pub mod coingecko;
pub mod coinmarketcap;
pub mod openai;
pub mod quicknode;
pub mod twitterapi;


pub use descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata, standard_task};
pub use registry::ProviderRegistry;
