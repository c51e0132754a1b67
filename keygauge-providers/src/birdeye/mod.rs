//! Birdeye provider implementation.
//!
//! Birdeye exposes usage only to a logged-in dashboard session:
//!
//! 1. `POST /user/login` exchanges `email:password` for a session token
//! 2. `GET /accounts/default` yields the subscription id and monthly units
//! 3. `GET /payments/subscriptions/{id}/usage` yields units used
//!
//! All three steps must succeed. The token lives for one fetch only.

mod adapter;
mod descriptor;
mod login;
pub(crate) mod parser;

pub use adapter::{BirdeyeAdapter, DEFAULT_BASE_URL};
pub use descriptor::birdeye_descriptor;
pub use login::{BirdeyeLogin, split_login};
pub use parser::{AccountResponse, LoginResponse, UsageResponse, parse_usage_responses};
