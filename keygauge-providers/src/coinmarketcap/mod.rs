//! CoinMarketCap provider implementation.
//!
//! The developer portal reports credits used but no monthly allowance for
//! the stats endpoint. The credential is a portal session token, sent as
//! the `s` cookie. Two calls run concurrently:
//!
//! - `GET /accounts/my/plan/stats` (required) yields this month's credits
//! - `GET /accounts/my/plan/info` (best effort) may yield `limit_monthly`
//!
//! When the plan reports a positive monthly limit it is used as-is;
//! otherwise the limit is estimated from the usage band table and the
//! metric is marked derived.

mod adapter;
mod descriptor;
pub(crate) mod parser;

pub use adapter::{CoinMarketCapAdapter, DEFAULT_BASE_URL};
pub use descriptor::coinmarketcap_descriptor;
pub use parser::{DayStats, PlanInfoResponse, UsageStats, parse_stats_response, resolve_limit};
