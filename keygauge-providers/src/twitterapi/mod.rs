//! TwitterAPI provider implementation.
//!
//! Keys are prepaid packages. `GET /oapi/my/info` only reports the credits
//! left, so the metric carries usage 0 and the balance as its limit.

mod adapter;
mod descriptor;
pub(crate) mod parser;

pub use adapter::{DEFAULT_BASE_URL, TwitterApiAdapter};
pub use descriptor::twitterapi_descriptor;
pub use parser::{TwitterApiBody, TwitterApiErrorBody, TwitterApiInfo, parse_info_response};
