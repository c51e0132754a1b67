//! QuickNode provider implementation.
//!
//! The console API reports RPC credit usage for the current billing period
//! at `GET /v0/usage/rpc`, authenticated with the `x-api-key` header.

mod adapter;
mod descriptor;
pub(crate) mod parser;

pub use adapter::{DEFAULT_BASE_URL, QuickNodeAdapter};
pub use descriptor::quicknode_descriptor;
pub use parser::{QuickNodeUsage, QuickNodeUsageEnvelope, parse_usage_response};
