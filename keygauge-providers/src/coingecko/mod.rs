//! CoinGecko provider implementation.
//!
//! Pro API keys report their own plan, monthly credit and remaining calls
//! at `GET /key`, authenticated with the `x-cg-pro-api-key` header.

mod adapter;
mod descriptor;
pub(crate) mod parser;

pub use adapter::{CoinGeckoAdapter, DEFAULT_BASE_URL};
pub use descriptor::coingecko_descriptor;
pub use parser::{CoinGeckoKeyResponse, parse_key_response};
