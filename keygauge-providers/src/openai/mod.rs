//! OpenAI provider implementation.
//!
//! OpenAI reports token usage per project API key but cost only for the
//! whole organization, and neither endpoint accepts a project key. Every
//! call is made with an admin key:
//!
//! 1. list projects, then each project's keys, to index key ids by the
//!    last four characters of the redacted key
//! 2. per configured key: sum `input_tokens` of completions usage over the
//!    last day, filtered by the key's id (paced one call per second)
//! 3. sum the organization's costs over the same window
//! 4. split the cost across the keys by their share of tokens
//!
//! Allocated usage is in whole US dollars and the limit is unknown (0).

mod adapter;
mod api;
mod descriptor;
pub(crate) mod parser;
mod task;

pub use adapter::OpenAiKeyAdapter;
pub use api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_PAUSE, KeyIndex, OpenAiApi, UsageWindow};
pub use descriptor::openai_descriptor;
pub use parser::{
    CostResponse, ListPage, ProjectApiKeysResponse, ProjectsResponse, UsageResponse,
    parse_cost_response, parse_usage_response,
};
pub use task::{OpenAiTask, allocate_outcomes};
